//! Seams between the lease engine and whatever persists projects and users.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::lease::{LeaseDecision, LeaseHold, LeaseRequest};
use crate::types::{DbId, UserProfile};

/// Lease columns of an existing project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseSnapshot {
    pub project_id: DbId,
    pub hold: Option<LeaseHold>,
}

/// Persistent lease state, one record per project.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Read the lease, run [`crate::lease::evaluate`] and persist its write as
    /// one atomic step for this project.
    ///
    /// Returns `None` if the project does not exist.
    async fn apply(
        &self,
        project_id: DbId,
        request: &LeaseRequest,
    ) -> Result<Option<LeaseDecision>, CoreError>;

    /// Current lease columns, or `None` if the project does not exist.
    async fn load(&self, project_id: DbId) -> Result<Option<LeaseSnapshot>, CoreError>;
}

/// User identity and project membership lookups.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn profile(&self, user_id: DbId) -> Result<Option<UserProfile>, CoreError>;

    /// `true` if the user owns the project or was added as a member.
    async fn is_member(&self, project_id: DbId, user_id: DbId) -> Result<bool, CoreError>;
}
