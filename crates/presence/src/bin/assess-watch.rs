//! Watches the caller's projects and logs who is editing them.
//!
//! With `EDIT_PROJECT_ID` set, also opens that project for editing and holds
//! the lease until Ctrl-C or until it is lost.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assess_core::clock::SystemClock;
use assess_core::types::DbId;
use assess_presence::aggregator::PresenceAggregator;
use assess_presence::cache::PresenceCache;
use assess_presence::client::{ApiClient, ClientError};
use assess_presence::config::PresenceConfig;
use assess_presence::poller::Poller;
use assess_presence::session::EditSession;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assess_presence=info,assess_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PresenceConfig::from_env();
    tracing::info!(
        api = %config.api_base_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        grace_ms = config.grace.as_millis() as u64,
        "Loaded presence configuration"
    );

    let edit_project: Option<DbId> = std::env::var("EDIT_PROJECT_ID")
        .ok()
        .map(|v| v.parse().expect("EDIT_PROJECT_ID must be a valid i64"));

    let client = Arc::new(ApiClient::new(
        config.api_base_url.clone(),
        config.access_token.clone(),
    ));
    let aggregator = Arc::new(PresenceAggregator::new(
        PresenceCache::new(config.grace_window()),
        Arc::new(SystemClock),
    ));

    let cancel = CancellationToken::new();
    let poller = Poller::new(
        Arc::clone(&client),
        Arc::clone(&aggregator),
        config.poll_interval,
    );
    let poller_handle = tokio::spawn(poller.run(cancel.clone()));

    let session = match edit_project {
        Some(project_id) => match EditSession::open(Arc::clone(&client), project_id).await {
            Ok(session) => Some(session),
            Err(ClientError::Locked { holder, since }) => {
                tracing::warn!(
                    project_id,
                    holder = %holder.name,
                    email = %holder.email,
                    %since,
                    "Project is being edited by someone else"
                );
                None
            }
            Err(e) => {
                tracing::error!(project_id, error = %e, "Failed to open project for editing");
                None
            }
        },
        None => None,
    };

    // Log editor changes once per poll interval.
    let mut shown: BTreeMap<DbId, String> = BTreeMap::new();
    let mut ticker = tokio::time::interval(config.poll_interval);
    {
        let session_lost = async {
            match &session {
                Some(s) => s.lost().await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(session_lost);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl-C, stopping");
                    break;
                }
                _ = &mut session_lost => {
                    tracing::warn!("Edit lease lost, stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let current = aggregator.editors().await;
                    log_changes(&shown, &current);
                    shown = current;
                }
            }
        }
    }

    cancel.cancel();
    if let Err(e) = poller_handle.await {
        tracing::warn!(error = %e, "Poller task failed");
    }
    if let Some(session) = session {
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to release edit lease");
        }
    }
}

fn log_changes(before: &BTreeMap<DbId, String>, after: &BTreeMap<DbId, String>) {
    for (project_id, name) in after {
        if before.get(project_id) != Some(name) {
            tracing::info!(project_id, editor = %name, "Project is being edited");
        }
    }
    for project_id in before.keys() {
        if !after.contains_key(project_id) {
            tracing::info!(project_id, "Project is no longer being edited");
        }
    }
}
