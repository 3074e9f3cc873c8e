//! Lease protocol engine: acquire, renew, release and status for projects.
//!
//! The engine owns no state. It reads the time from its [`Clock`], checks
//! membership through the [`Directory`], and hands each operation to the
//! [`LeaseStore`], which evaluates and persists it atomically.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::lease::store::{Directory, LeaseStore};
use crate::lease::{
    active_hold, currently_editing, default_ttl, CurrentlyEditing, LeaseCommand, LeaseDecision,
    LeaseHold, LeaseRequest, UNKNOWN_USER_NAME,
};
use crate::types::{DbId, Timestamp, UserProfile};

/// Who holds a lease, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockHolder {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub since: Timestamp,
}

impl LockHolder {
    fn resolve(user_id: DbId, since: Timestamp, profile: Option<UserProfile>) -> Self {
        match profile {
            Some(p) => Self {
                user_id,
                name: p.name,
                email: p.email,
                since,
            },
            None => Self {
                user_id,
                name: UNKNOWN_USER_NAME.to_string(),
                email: String::new(),
                since,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Granted { since: Timestamp },
    /// Someone else holds an active lease. Expected under contention.
    Denied(LockHolder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewOutcome {
    Renewed,
    /// The caller is not the recorded holder; its lease was lost.
    NotLockOwner,
}

/// An active lease as reported by [`LeaseEngine::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLease {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub since: Timestamp,
    pub last_edit_ping: Timestamp,
}

pub struct LeaseEngine {
    store: Arc<dyn LeaseStore>,
    directory: Arc<dyn Directory>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl LeaseEngine {
    pub fn new(
        store: Arc<dyn LeaseStore>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            ttl: default_ttl(),
        }
    }

    /// Override the lease TTL (default [`crate::lease::LOCK_TTL_SECS`]).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Acquire (or re-acquire) the editing lease on a project.
    ///
    /// Fails with `NotFound` for a missing project and `Forbidden` for a
    /// caller who is not a member. Contention is reported as
    /// [`AcquireOutcome::Denied`].
    pub async fn acquire(
        &self,
        project_id: DbId,
        requester_id: DbId,
    ) -> Result<AcquireOutcome, CoreError> {
        self.require_project(project_id).await?;
        if !self.directory.is_member(project_id, requester_id).await? {
            return Err(CoreError::Forbidden(
                "You are not a member of this project".into(),
            ));
        }

        match self
            .run(project_id, LeaseCommand::Acquire, requester_id)
            .await?
        {
            LeaseDecision::Granted { since, .. } => Ok(AcquireOutcome::Granted { since }),
            LeaseDecision::Denied { holder_id, since } => {
                let profile = self.directory.profile(holder_id).await?;
                Ok(AcquireOutcome::Denied(LockHolder::resolve(
                    holder_id, since, profile,
                )))
            }
            other => Err(unexpected(LeaseCommand::Acquire, other)),
        }
    }

    /// Heartbeat from the lease holder.
    pub async fn renew(
        &self,
        project_id: DbId,
        requester_id: DbId,
    ) -> Result<RenewOutcome, CoreError> {
        match self
            .run(project_id, LeaseCommand::Renew, requester_id)
            .await?
        {
            LeaseDecision::Renewed => Ok(RenewOutcome::Renewed),
            LeaseDecision::NotLockOwner => Ok(RenewOutcome::NotLockOwner),
            other => Err(unexpected(LeaseCommand::Renew, other)),
        }
    }

    /// Give the lease up. Succeeds whether or not the caller held it.
    ///
    /// Returns `true` if the lease was actually cleared.
    pub async fn release(&self, project_id: DbId, requester_id: DbId) -> Result<bool, CoreError> {
        match self
            .run(project_id, LeaseCommand::Release, requester_id)
            .await?
        {
            LeaseDecision::Released => Ok(true),
            LeaseDecision::ReleaseIgnored => Ok(false),
            other => Err(unexpected(LeaseCommand::Release, other)),
        }
    }

    /// The active lease on a project, or `None` if vacant or expired.
    pub async fn status(&self, project_id: DbId) -> Result<Option<ActiveLease>, CoreError> {
        let snapshot = self.require_project(project_id).await?;
        let now = self.clock.now();
        let Some(hold) = active_hold(snapshot.as_ref(), now, self.ttl).copied() else {
            return Ok(None);
        };

        let holder = LockHolder::resolve(
            hold.user_id,
            hold.since,
            self.directory.profile(hold.user_id).await?,
        );
        Ok(Some(ActiveLease {
            user_id: holder.user_id,
            name: holder.name,
            email: holder.email,
            since: hold.since,
            last_edit_ping: hold.last_ping,
        }))
    }

    /// `currently_editing` projection for a project listing, evaluated now.
    pub fn currently_editing(
        &self,
        hold: Option<&LeaseHold>,
        holder_name: Option<&str>,
    ) -> Option<CurrentlyEditing> {
        currently_editing(hold, holder_name, self.clock.now(), self.ttl)
    }

    async fn require_project(&self, project_id: DbId) -> Result<Option<LeaseHold>, CoreError> {
        self.store
            .load(project_id)
            .await?
            .map(|snapshot| snapshot.hold)
            .ok_or_else(|| CoreError::project_not_found(project_id))
    }

    async fn run(
        &self,
        project_id: DbId,
        command: LeaseCommand,
        user_id: DbId,
    ) -> Result<LeaseDecision, CoreError> {
        let request = LeaseRequest {
            command,
            user_id,
            now: self.clock.now(),
            ttl: self.ttl,
        };
        self.store
            .apply(project_id, &request)
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id))
    }
}

fn unexpected(command: LeaseCommand, decision: LeaseDecision) -> CoreError {
    CoreError::Internal(format!("lease store returned {decision:?} for {command:?}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
