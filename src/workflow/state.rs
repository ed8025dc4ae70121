use serde::Serialize;

use crate::{error::WorkflowError, models::ProofPurpose};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "kind", content = "purpose")]
pub enum WorkflowStep {
    #[default]
    Idle,
    AwaitingProof(ProofPurpose),
    Executing,
    Succeeded,
    Failed,
}

/// Snapshot published to the presentation layer after every transition.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState<R> {
    pub step: WorkflowStep,
    pub loading: bool,
    /// Latest displayable error; replaced on every new attempt.
    pub error: Option<String>,
    pub result: Option<R>,
    /// Kind of the action parked behind the proof step, if any.
    pub pending: Option<&'static str>,
}

impl<R> Default for WorkflowState<R> {
    fn default() -> Self {
        Self {
            step: WorkflowStep::Idle,
            loading: false,
            error: None,
            result: None,
            pending: None,
        }
    }
}

impl<R> WorkflowState<R> {
    pub(crate) fn await_proof(&mut self, purpose: ProofPurpose, kind: &'static str) {
        self.step = WorkflowStep::AwaitingProof(purpose);
        self.loading = false;
        self.error = None;
        self.pending = Some(kind);
    }

    pub(crate) fn begin(&mut self) {
        self.step = WorkflowStep::Executing;
        self.loading = true;
        self.error = None;
        self.pending = None;
    }

    pub(crate) fn succeed(&mut self, record: R) {
        self.step = WorkflowStep::Succeeded;
        self.loading = false;
        self.error = None;
        self.result = Some(record);
        self.pending = None;
    }

    pub(crate) fn fail(&mut self, error: &WorkflowError) {
        self.step = WorkflowStep::Failed;
        self.loading = false;
        self.error = Some(error.to_string());
        self.pending = None;
    }
}

/// One-shot notifications for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowEvent {
    RequireProof(ProofPurpose),
}

/// What a single request or replay ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<R> {
    /// No valid proof session; the action is parked until proof arrives.
    Gated(ProofPurpose),
    Completed(R),
    Failed(WorkflowError),
    /// Another action for this feature is still executing; nothing was done.
    Busy,
}

impl<R> RequestOutcome<R> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RequestOutcome::Completed(_))
    }
}
