//! Holding a project's edit lease while it is open.
//!
//! [`EditSession::open`] acquires the lease and starts a heartbeat that
//! renews it well inside the TTL. If a renew comes back `not_lock_owner` the
//! lease was lost (it expired and someone else took it); the session flips
//! to [`SessionState::Lost`] and the heartbeat stops. A renew that fails with
//! not-found or an auth error ends the session the same way. There is no push
//! notification of a takeover; the next heartbeat is how a holder finds out.

use std::sync::Arc;
use std::time::Duration;

use assess_core::lease::HEARTBEAT_INTERVAL_SECS;
use assess_core::types::DbId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, ClientError};

/// Lifecycle of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The lease is held and being renewed.
    Active,
    /// A renew was rejected; another user may be editing now, or the
    /// project or credentials are gone.
    Lost,
    /// The session was closed by its owner.
    Closed,
}

#[derive(Debug)]
pub struct EditSession {
    project_id: DbId,
    client: Arc<ApiClient>,
    cancel: CancellationToken,
    heartbeat: Option<JoinHandle<()>>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl EditSession {
    /// Acquire the lease and start heartbeating every
    /// [`HEARTBEAT_INTERVAL_SECS`].
    pub async fn open(client: Arc<ApiClient>, project_id: DbId) -> Result<Self, ClientError> {
        Self::open_with_interval(
            client,
            project_id,
            Duration::from_secs(HEARTBEAT_INTERVAL_SECS),
        )
        .await
    }

    /// Like [`EditSession::open`] with a custom heartbeat period.
    ///
    /// Contention surfaces as [`ClientError::Locked`] and no session is
    /// created.
    pub async fn open_with_interval(
        client: Arc<ApiClient>,
        project_id: DbId,
        heartbeat_every: Duration,
    ) -> Result<Self, ClientError> {
        client.acquire(project_id).await?;
        tracing::info!(project_id, "Edit session opened");

        let cancel = CancellationToken::new();
        let (state_tx, _) = watch::channel(SessionState::Active);
        let state_tx = Arc::new(state_tx);

        let heartbeat = tokio::spawn(heartbeat_loop(
            Arc::clone(&client),
            project_id,
            heartbeat_every,
            cancel.clone(),
            Arc::clone(&state_tx),
        ));

        Ok(Self {
            project_id,
            client,
            cancel,
            heartbeat: Some(heartbeat),
            state_tx,
        })
    }

    pub fn project_id(&self) -> DbId {
        self.project_id
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Watch for state changes, e.g. to stop editing when the lease is lost.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Resolve once the lease has been lost.
    ///
    /// Never resolves for a session that stays active until it is closed.
    pub async fn lost(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this only errors after close.
        let _ = rx.wait_for(|s| *s == SessionState::Lost).await;
    }

    /// Stop the heartbeat and release the lease.
    ///
    /// Release is sent even after the lease was lost; the server treats a
    /// release from a non-holder as a no-op.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.cancel.cancel();
        if let Some(handle) = self.heartbeat.take() {
            if let Err(e) = handle.await {
                tracing::warn!(project_id = self.project_id, error = %e, "Heartbeat task failed");
            }
        }

        let result = self.client.release(self.project_id).await;
        self.state_tx.send_replace(SessionState::Closed);
        match &result {
            Ok(()) => tracing::info!(project_id = self.project_id, "Edit session closed"),
            Err(e) => tracing::warn!(project_id = self.project_id, error = %e, "Release failed"),
        }
        result
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        // A dropped session stops renewing; the lease then expires on its own.
        self.cancel.cancel();
    }
}

async fn heartbeat_loop(
    client: Arc<ApiClient>,
    project_id: DbId,
    every: Duration,
    cancel: CancellationToken,
    state_tx: Arc<watch::Sender<SessionState>>,
) {
    // The acquire that opened the session counts as the first ping.
    let start = tokio::time::Instant::now() + every;
    let mut interval = tokio::time::interval_at(start, every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                match client.renew(project_id).await {
                    Ok(()) => tracing::debug!(project_id, "Edit lock renewed"),
                    Err(ClientError::NotLockOwner) => {
                        tracing::warn!(project_id, "Edit lock lost, another user may be editing");
                        state_tx.send_replace(SessionState::Lost);
                        break;
                    }
                    Err(
                        e @ (ClientError::NotFound(_)
                        | ClientError::Unauthorized(_)
                        | ClientError::Forbidden(_)),
                    ) => {
                        tracing::error!(
                            project_id,
                            error = %e,
                            "Edit lock renew rejected, giving up"
                        );
                        state_tx.send_replace(SessionState::Lost);
                        break;
                    }
                    // Transient failures are retried on the next tick; the
                    // TTL decides whether the lease survives them.
                    Err(e) => tracing::warn!(project_id, error = %e, "Edit lock renew failed"),
                }
            }
        }
    }
}
