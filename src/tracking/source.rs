use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::GpsReading;

const SUBSCRIPTION_BUFFER: usize = 16;

/// Platform location provider.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Resolve permission/provider and start delivering fixes roughly every
    /// `interval`. Dropping the returned subscription unsubscribes.
    async fn subscribe(&self, interval: Duration) -> Result<LocationSubscription>;

    async fn last_known(&self) -> Option<GpsReading>;
}

/// Receiving end of a location feed. Delivery ends when this is dropped.
pub struct LocationSubscription {
    receiver: mpsc::Receiver<GpsReading>,
}

impl LocationSubscription {
    pub fn new(receiver: mpsc::Receiver<GpsReading>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<GpsReading> {
        self.receiver.recv().await
    }
}

/// Feed driven by hand: every `push` goes to all live subscribers. Backs
/// simulations and tests; a platform bridge can use it as its sink too.
#[derive(Clone, Default)]
pub struct ChannelLocationSource {
    inner: Arc<Mutex<SourceState>>,
}

#[derive(Default)]
struct SourceState {
    subscribers: Vec<mpsc::Sender<GpsReading>>,
    last: Option<GpsReading>,
    denied: bool,
}

impl ChannelLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a missing location permission.
    pub fn deny_permission(&self) {
        self.state().denied = true;
    }

    /// Deliver a fix. Returns how many subscribers accepted it.
    pub fn push(&self, fix: GpsReading) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|tx| !tx.is_closed());
        let delivered = state
            .subscribers
            .iter()
            .filter(|tx| tx.try_send(fix.clone()).is_ok())
            .count();
        state.last = Some(fix);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl LocationSource for ChannelLocationSource {
    async fn subscribe(&self, _interval: Duration) -> Result<LocationSubscription> {
        let mut state = self.state();
        if state.denied {
            anyhow::bail!("location permission denied");
        }
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        state.subscribers.push(tx);
        Ok(LocationSubscription::new(rx))
    }

    async fn last_known(&self) -> Option<GpsReading> {
        self.state().last.clone()
    }
}
