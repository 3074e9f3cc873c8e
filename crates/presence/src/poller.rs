//! Interval loop that polls the project list into a [`PresenceAggregator`].
//!
//! Each tick spawns its own request task and moves on; a slow request is
//! never cancelled or awaited by the loop. Ordering is restored by the
//! aggregator's sequence check when the responses land.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::aggregator::PresenceAggregator;
use crate::client::ApiClient;

pub struct Poller {
    client: Arc<ApiClient>,
    aggregator: Arc<PresenceAggregator>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        client: Arc<ApiClient>,
        aggregator: Arc<PresenceAggregator>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            aggregator,
            interval,
        }
    }

    /// Issue one poll in the background.
    ///
    /// Failures are logged and dropped; the cache simply is not refreshed
    /// for this cycle.
    pub fn poll_once(&self) -> JoinHandle<()> {
        let seq = self.aggregator.begin_poll();
        let client = Arc::clone(&self.client);
        let aggregator = Arc::clone(&self.aggregator);

        tokio::spawn(async move {
            match client.list_projects().await {
                Ok(projects) => {
                    aggregator.complete_poll(seq, projects).await;
                }
                Err(e) => {
                    tracing::warn!(seq, error = %e, "Project poll failed");
                }
            }
        })
    }

    /// Poll on every interval tick until `cancel` fires.
    ///
    /// Requests already in flight when the loop stops are left to finish.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Presence poller started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Presence poller cancelled");
                    break;
                }
                _ = interval.tick() => {
                    // Dropping the handle detaches the request; it is not cancelled.
                    drop(self.poll_once());
                }
            }
        }
    }
}
