//! Project entity model, its lease columns, and DTOs.

use assess_core::lease::LeaseHold;
use assess_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub owner_user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub editing_by_user_id: Option<DbId>,
    pub editing_since: Option<Timestamp>,
    pub last_edit_ping: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// The lease columns as a [`LeaseHold`], expired or not.
    pub fn lease_hold(&self) -> Option<LeaseHold> {
        LeaseHold::from_columns(
            self.editing_by_user_id,
            self.editing_since,
            self.last_edit_ping,
        )
    }
}

/// A project joined with the display name of its recorded lease holder.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectWithHolder {
    #[sqlx(flatten)]
    pub project: Project,
    pub holder_name: Option<String>,
}

/// Only the lease columns, as locked by the lease store.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectLeaseRow {
    pub editing_by_user_id: Option<DbId>,
    pub editing_since: Option<Timestamp>,
    pub last_edit_ping: Option<Timestamp>,
}

impl ProjectLeaseRow {
    pub fn hold(&self) -> Option<LeaseHold> {
        LeaseHold::from_columns(
            self.editing_by_user_id,
            self.editing_since,
            self.last_edit_ping,
        )
    }
}

/// DTO for creating a new project. The owner is the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

/// DTO for sharing a project with another user.
#[derive(Debug, Clone, Deserialize)]
pub struct AddProjectMember {
    pub user_id: DbId,
}
