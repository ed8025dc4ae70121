use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{credentials::CredentialStore, device::DeviceInfo, gateway::ActionGateway};

use super::{
    loop_worker::{tracking_loop, TrackingContext},
    source::LocationSource,
};

/// Owns the background tracking task: `Stopped -> Running -> Stopped`.
///
/// The loop may also stop itself when the login credential expires;
/// `is_running` reflects that without a call to `stop`.
pub struct TrackingController {
    gateway: ActionGateway,
    source: Arc<dyn LocationSource>,
    credentials: Arc<dyn CredentialStore>,
    device: Arc<dyn DeviceInfo>,
    interval: Duration,
    ping_timeout: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl TrackingController {
    pub fn new(
        gateway: ActionGateway,
        source: Arc<dyn LocationSource>,
        credentials: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfo>,
        interval: Duration,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            source,
            credentials,
            device,
            interval,
            ping_timeout,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to the location source and spawn the loop. A second call
    /// while running is a no-op.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            info!("tracking already running; start ignored");
            return Ok(());
        }

        // Reap a loop that ended on its own (credential expiry, closed feed).
        self.cancel_token = None;
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("previous tracking loop task failed to join")?;
        }

        let subscription = self
            .source
            .subscribe(self.interval)
            .await
            .context("failed to subscribe to location updates")?;

        let cancel_token = CancellationToken::new();
        let ctx = TrackingContext {
            gateway: self.gateway.clone(),
            credentials: Arc::clone(&self.credentials),
            device: Arc::clone(&self.device),
            ping_timeout: self.ping_timeout,
            running: Arc::clone(&self.running),
        };

        self.running.store(true, Ordering::SeqCst);
        let handle = tokio::spawn(tracking_loop(ctx, subscription, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!(
            "tracking started (interval {}s)",
            self.interval.as_secs()
        );
        Ok(())
    }

    /// Cancel the loop and wait for it to drop its subscription. Safe to call
    /// when already stopped.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let joined = match self.handle.take() {
            Some(handle) => handle
                .await
                .context("tracking loop task failed to join")
                .map(|_| ()),
            None => Ok(()),
        };

        self.running.store(false, Ordering::SeqCst);
        joined
    }
}
