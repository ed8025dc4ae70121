use async_trait::async_trait;

use crate::{
    error::WorkflowResult,
    gateway::ActionGateway,
    models::{AttendanceAction, AttendanceRecord, AttendanceStatus, ProofPurpose, ProofSession},
    validators::{validate_gps, Verdict},
};

use super::{
    controller::{captured_gps, Feature},
    RequestOutcome, WorkflowController,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceFeature;

#[async_trait]
impl Feature for AttendanceFeature {
    type Action = AttendanceAction;
    type Record = AttendanceRecord;

    const NAME: &'static str = "attendance";

    fn purpose(&self) -> ProofPurpose {
        ProofPurpose::Attendance
    }

    fn kind(action: &AttendanceAction) -> &'static str {
        action.kind()
    }

    fn validate(&self, action: &AttendanceAction) -> Verdict {
        validate_gps(action.gps())
    }

    async fn execute(
        &self,
        gateway: &ActionGateway,
        session: &ProofSession,
        action: &AttendanceAction,
    ) -> WorkflowResult<AttendanceRecord> {
        let gps = captured_gps(action.gps())?;
        match action {
            AttendanceAction::CheckIn { .. } => gateway.check_in(session, gps).await,
            AttendanceAction::CheckOut { .. } => gateway.check_out(session, gps).await,
        }
    }
}

pub type AttendanceController = WorkflowController<AttendanceFeature>;

impl WorkflowController<AttendanceFeature> {
    pub fn attendance(gateway: ActionGateway) -> Self {
        Self::new(AttendanceFeature, gateway)
    }

    /// Last known status; `Unknown` until something was loaded.
    pub fn status(&self) -> AttendanceStatus {
        self.state()
            .result
            .map(|record| record.status)
            .unwrap_or_default()
    }

    /// Ungated read of the server-side status.
    pub async fn refresh_status(&self) -> RequestOutcome<AttendanceRecord> {
        let gateway = self.gateway().clone();
        self.run_read(async move { gateway.attendance_status().await })
            .await
    }
}
