use std::{
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};

use crate::{
    error::{WorkflowError, WorkflowResult},
    gateway::{ActionGateway, Authorization},
    models::{GpsReading, ProofPurpose, ProofSession},
    validators::Verdict,
};

use super::{RequestOutcome, WorkflowEvent, WorkflowState, WorkflowStep};

const ENABLE_LOGS: bool = true;

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_BUFFER: usize = 16;

use crate::{log_debug, log_info, log_warn};

/// What a feature plugs into the shared request/proof/replay machinery.
#[async_trait]
pub trait Feature: Send + Sync + 'static {
    type Action: Clone + Debug + Send + Sync + 'static;
    type Record: Clone + Debug + Send + Sync + 'static;

    const NAME: &'static str;

    fn purpose(&self) -> ProofPurpose;

    fn kind(action: &Self::Action) -> &'static str;

    /// Checks on the inputs captured with the request. Must be pure.
    fn validate(&self, action: &Self::Action) -> Verdict;

    /// Exactly one remote call.
    async fn execute(
        &self,
        gateway: &ActionGateway,
        session: &ProofSession,
        action: &Self::Action,
    ) -> WorkflowResult<Self::Record>;
}

/// Per-feature state machine:
/// `Idle -> AwaitingProof -> Executing -> Succeeded | Failed`.
///
/// At most one action runs at a time; a request arriving while another is
/// executing is answered with `RequestOutcome::Busy`. An action that hits the
/// proof gate is parked as the single pending action and replayed once when
/// `proof_supplied` is called.
pub struct WorkflowController<F: Feature> {
    feature: Arc<F>,
    gateway: ActionGateway,
    pending: Arc<Mutex<Option<F::Action>>>,
    in_flight: Arc<AsyncMutex<()>>,
    state_tx: Arc<watch::Sender<WorkflowState<F::Record>>>,
    events_tx: broadcast::Sender<WorkflowEvent>,
}

impl<F: Feature> Clone for WorkflowController<F> {
    fn clone(&self) -> Self {
        Self {
            feature: Arc::clone(&self.feature),
            gateway: self.gateway.clone(),
            pending: Arc::clone(&self.pending),
            in_flight: Arc::clone(&self.in_flight),
            state_tx: Arc::clone(&self.state_tx),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Mode {
    Fresh,
    Replay,
}

impl<F: Feature> WorkflowController<F> {
    pub fn new(feature: F, gateway: ActionGateway) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::default());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            feature: Arc::new(feature),
            gateway,
            pending: Arc::new(Mutex::new(None)),
            in_flight: Arc::new(AsyncMutex::new(())),
            state_tx: Arc::new(state_tx),
            events_tx,
        }
    }

    pub fn state(&self) -> WorkflowState<F::Record> {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState<F::Record>> {
        self.state_tx.subscribe()
    }

    /// Listen for one-shot events. Only events sent after this call are
    /// delivered; one emitted with nobody listening is dropped, and the
    /// snapshot still shows `AwaitingProof` for a late listener.
    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events_tx.subscribe()
    }

    pub fn pending_action(&self) -> Option<F::Action> {
        lock(&self.pending).clone()
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    /// Entry point for a user intent. Inputs carried by `action` were captured
    /// before gating and are reused verbatim on replay.
    pub async fn request(&self, action: F::Action) -> RequestOutcome<F::Record> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            log_warn!(
                "{}: {} requested while another action is executing; rejected",
                F::NAME,
                F::kind(&action)
            );
            return RequestOutcome::Busy;
        };

        if let Some(previous) = lock(&self.pending).take() {
            log_warn!(
                "{}: {} replaces pending {} that was still waiting for proof",
                F::NAME,
                F::kind(&action),
                F::kind(&previous)
            );
        }

        self.run(action, Mode::Fresh).await
    }

    /// Signal that a proof session was just stored. Replays the pending action
    /// once; without one this is a no-op and returns `None`.
    pub async fn proof_supplied(&self) -> Option<RequestOutcome<F::Record>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            log_warn!("{}: proof supplied while executing; pending action kept", F::NAME);
            return Some(RequestOutcome::Busy);
        };

        let action = lock(&self.pending).take()?;
        log_info!("{}: replaying {} after proof", F::NAME, F::kind(&action));
        Some(self.run(action, Mode::Replay).await)
    }

    /// Verify a face photo for this feature's purpose, then replay. A failed
    /// verification keeps the pending action so the user can try again.
    pub async fn complete_proof(
        &self,
        photo: &[u8],
        gps: Option<&GpsReading>,
    ) -> Option<RequestOutcome<F::Record>> {
        let purpose = self.feature.purpose();
        match self.gateway.verify_proof(purpose, photo, gps).await {
            Ok(_) => self.proof_supplied().await,
            Err(err) => {
                log_warn!("{}: face verification failed: {}", F::NAME, err);
                self.state_tx.send_modify(|state| state.error = Some(err.to_string()));
                Some(RequestOutcome::Failed(err))
            }
        }
    }

    /// User dismissed the proof step. Drops the pending action.
    pub fn cancel_proof(&self) {
        let dropped = lock(&self.pending).take();
        if let Some(action) = dropped {
            log_info!("{}: proof cancelled, dropping {}", F::NAME, F::kind(&action));
            self.state_tx.send_modify(|state| {
                if matches!(state.step, WorkflowStep::AwaitingProof(_)) {
                    state.step = WorkflowStep::Idle;
                }
                state.pending = None;
            });
        }
    }

    /// Run a plain read under the in-flight guard and fold it into the
    /// snapshot the same way an action result is.
    pub(crate) async fn run_read<Fut>(&self, read: Fut) -> RequestOutcome<F::Record>
    where
        Fut: std::future::Future<Output = WorkflowResult<F::Record>>,
    {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return RequestOutcome::Busy;
        };

        self.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let result = read.await;
        self.state_tx.send_modify(|state| {
            state.loading = false;
            match &result {
                Ok(record) => {
                    state.result = Some(record.clone());
                    state.error = None;
                }
                Err(err) => state.error = Some(err.to_string()),
            }
        });

        match result {
            Ok(record) => RequestOutcome::Completed(record),
            Err(err) => RequestOutcome::Failed(err),
        }
    }

    async fn run(&self, action: F::Action, mode: Mode) -> RequestOutcome<F::Record> {
        let purpose = self.feature.purpose();
        let kind = F::kind(&action);

        let session = match self.gateway.authorize(purpose) {
            Authorization::Allowed(session) => session,
            Authorization::NeedsProof => match mode {
                Mode::Fresh => {
                    log_info!("{}: {} needs proof for {}", F::NAME, kind, purpose.as_str());
                    *lock(&self.pending) = Some(action);
                    self.state_tx
                        .send_modify(|state| state.await_proof(purpose, kind));
                    if self
                        .events_tx
                        .send(WorkflowEvent::RequireProof(purpose))
                        .is_err()
                    {
                        log_debug!("{}: no event listener for RequireProof", F::NAME);
                    }
                    return RequestOutcome::Gated(purpose);
                }
                Mode::Replay => {
                    // One replay only; a still-missing proof ends the attempt.
                    log_warn!(
                        "{}: replayed {} still lacks a valid {} proof",
                        F::NAME,
                        kind,
                        purpose.as_str()
                    );
                    let err = WorkflowError::AuthorizationRequired;
                    self.state_tx.send_modify(|state| state.fail(&err));
                    return RequestOutcome::Failed(err);
                }
            },
        };

        if let Verdict::Invalid(reason) = self.feature.validate(&action) {
            log_info!("{}: {} rejected by validation: {}", F::NAME, kind, reason);
            let err = WorkflowError::Validation(reason);
            self.state_tx.send_modify(|state| state.fail(&err));
            return RequestOutcome::Failed(err);
        }

        self.state_tx.send_modify(|state| state.begin());

        match self.feature.execute(&self.gateway, &session, &action).await {
            Ok(record) => {
                log_info!("{}: {} succeeded", F::NAME, kind);
                self.state_tx
                    .send_modify(|state| state.succeed(record.clone()));
                RequestOutcome::Completed(record)
            }
            Err(err) => {
                log_warn!("{}: {} failed: {}", F::NAME, kind, err);
                self.state_tx.send_modify(|state| state.fail(&err));
                RequestOutcome::Failed(err)
            }
        }
    }
}

/// Location captured with the request; validation has already checked it.
pub(crate) fn captured_gps(gps: Option<&GpsReading>) -> WorkflowResult<&GpsReading> {
    gps.ok_or_else(|| WorkflowError::Unexpected("location missing after validation".into()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
