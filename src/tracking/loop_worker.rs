use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;

use crate::{
    credentials::CredentialStore,
    device::DeviceInfo,
    gateway::ActionGateway,
    models::{GpsReading, TrackingSample},
    validators::{validate_tracking_sample, Verdict},
};

use super::source::LocationSubscription;

// Set to false to silence per-sample chatter from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Everything one iteration needs; cloned into the worker task.
#[derive(Clone)]
pub(crate) struct TrackingContext {
    pub gateway: ActionGateway,
    pub credentials: Arc<dyn CredentialStore>,
    pub device: Arc<dyn DeviceInfo>,
    pub ping_timeout: Duration,
    pub running: Arc<AtomicBool>,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

pub(crate) async fn tracking_loop(
    ctx: TrackingContext,
    mut subscription: LocationSubscription,
    cancel_token: CancellationToken,
) {
    log_info!("tracking loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("tracking loop shutting down");
                break;
            }
            fix = subscription.recv() => {
                let Some(fix) = fix else {
                    log_warn!("location feed closed; tracking loop exiting");
                    break;
                };
                if cancel_token.is_cancelled() {
                    break;
                }
                if handle_fix(&ctx, fix) == Step::Stop {
                    break;
                }
            }
        }
    }

    // Dropping the subscription here is the unsubscribe.
    drop(subscription);
    ctx.running.store(false, Ordering::SeqCst);
}

fn handle_fix(ctx: &TrackingContext, fix: GpsReading) -> Step {
    let now = ctx.gateway.clock().now();
    if !ctx.credentials.is_valid_at(now) {
        log_warn!("login credential no longer valid; stopping tracking");
        if let Err(err) = ctx.credentials.clear() {
            log_error!("failed to clear credentials after expiry: {err:#}");
        }
        return Step::Stop;
    }

    let sample = TrackingSample::from_fix(&fix, ctx.device.battery());
    if let Verdict::Invalid(reason) = validate_tracking_sample(&sample) {
        log_debug!("dropping tracking sample: {reason}");
        return Step::Continue;
    }

    let gateway = ctx.gateway.clone();
    let timeout = ctx.ping_timeout;
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, gateway.submit_tracking_ping(&sample)).await {
            Ok(Ok(())) => log_debug!(
                "tracking ping sent ({:.5}, {:.5})",
                sample.latitude,
                sample.longitude
            ),
            Ok(Err(err)) => log_warn!("tracking ping failed: {err}"),
            Err(_) => log_warn!("tracking ping timed out after {}s", timeout.as_secs()),
        }
    });

    Step::Continue
}
