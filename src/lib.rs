pub mod api;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod device;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session_store;
pub mod tracking;
pub mod utils;
pub mod validators;
pub mod workflow;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Result;

pub use api::{ApiError, FieldApi, HttpFieldApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use device::{DeviceInfo, HostDeviceInfo, StaticDeviceInfo};
pub use error::{WorkflowError, WorkflowResult};
pub use gateway::{ActionGateway, Authorization};
pub use session_store::SessionStore;
pub use tracking::{ChannelLocationSource, LocationSource, LocationSubscription, TrackingController};
pub use utils::init_logging;
pub use workflow::{
    AttendanceController, RequestOutcome, TaskController, WorkflowEvent, WorkflowState,
    WorkflowStep,
};

/// Everything a host needs for one signed-in device: the shared gateway,
/// one controller per gated feature and the duty tracking loop.
///
/// All controllers share a single `SessionStore` through the gateway, so a
/// proof obtained for one purpose is visible to the matching controller only.
pub struct FieldClient {
    config: ClientConfig,
    gateway: ActionGateway,
    attendance: AttendanceController,
    tasks: TaskController,
    tracking: TrackingController,
}

impl FieldClient {
    /// Wire the reqwest backend described by `config`.
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfo>,
        location: Arc<dyn LocationSource>,
    ) -> Result<Self> {
        config.validate()?;
        let api = HttpFieldApi::new(
            &config.base_url,
            config.request_timeout(),
            Arc::clone(&credentials),
        )?;

        Ok(Self::with_api(
            config,
            Arc::new(api),
            Arc::new(SystemClock),
            credentials,
            device,
            location,
        ))
    }

    pub fn with_api(
        config: ClientConfig,
        api: Arc<dyn FieldApi>,
        clock: Arc<dyn Clock>,
        credentials: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfo>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        let gateway = ActionGateway::new(
            api,
            SessionStore::new(),
            clock,
            Arc::clone(&credentials),
            Arc::clone(&device),
            config.proof_ttl(),
        );
        let attendance = AttendanceController::attendance(gateway.clone());
        let tasks = TaskController::tasks(gateway.clone());
        let tracking = TrackingController::new(
            gateway.clone(),
            location,
            credentials,
            device,
            config.tracking_interval(),
            config.request_timeout(),
        );

        log::info!("field client ready for {}", config.base_url);

        Self {
            config,
            gateway,
            attendance,
            tasks,
            tracking,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    pub fn attendance(&self) -> &AttendanceController {
        &self.attendance
    }

    pub fn tasks(&self) -> &TaskController {
        &self.tasks
    }

    pub fn tracking(&mut self) -> &mut TrackingController {
        &mut self.tracking
    }

    /// Stop tracking, then drop the login credential and any proof session.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.tracking.stop().await?;
        self.gateway.logout()?;
        self.attendance.cancel_proof();
        self.tasks.cancel_proof();
        Ok(())
    }
}
