//! Edit-lease columns of the `projects` table.
//!
//! Every lease operation runs in its own transaction that locks the project
//! row with `SELECT ... FOR UPDATE`, evaluates the request with
//! [`assess_core::lease::evaluate`], and writes the result back before
//! committing. Concurrent acquires on one project therefore serialize on the
//! row lock and the second one sees the first one's lease.

use assess_core::error::CoreError;
use assess_core::lease::{
    evaluate, Directory, LeaseDecision, LeaseRequest, LeaseSnapshot, LeaseStore, LeaseWrite,
};
use assess_core::types::{DbId, UserProfile};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::project::ProjectLeaseRow;
use crate::repositories::{ProjectMemberRepo, UserRepo};

/// Column list for lease queries.
const LEASE_COLUMNS: &str = "editing_by_user_id, editing_since, last_edit_ping";

/// Provides atomic lease operations on projects.
pub struct ProjectLeaseRepo;

impl ProjectLeaseRepo {
    /// Read the lease columns of a non-deleted project.
    pub async fn load(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<ProjectLeaseRow>, sqlx::Error> {
        let query = format!(
            "SELECT {LEASE_COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ProjectLeaseRow>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Evaluate and persist a lease request under a row lock.
    ///
    /// Returns `None` if the project does not exist or is soft-deleted.
    pub async fn apply(
        pool: &PgPool,
        project_id: DbId,
        request: &LeaseRequest,
    ) -> Result<Option<LeaseDecision>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {LEASE_COLUMNS} FROM projects \
             WHERE id = $1 AND deleted_at IS NULL \
             FOR UPDATE"
        );
        let Some(row) = sqlx::query_as::<_, ProjectLeaseRow>(&query)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let transition = evaluate(row.hold().as_ref(), request);
        match transition.write {
            LeaseWrite::Keep => {}
            LeaseWrite::Set(hold) => {
                sqlx::query(
                    "UPDATE projects SET editing_by_user_id = $2, editing_since = $3, \
                     last_edit_ping = $4 WHERE id = $1",
                )
                .bind(project_id)
                .bind(hold.user_id)
                .bind(hold.since)
                .bind(hold.last_ping)
                .execute(&mut *tx)
                .await?;
            }
            LeaseWrite::Clear => {
                sqlx::query(
                    "UPDATE projects SET editing_by_user_id = NULL, editing_since = NULL, \
                     last_edit_ping = NULL WHERE id = $1",
                )
                .bind(project_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(Some(transition.decision))
    }
}

/// [`LeaseStore`] and [`Directory`] backed by Postgres.
#[derive(Clone)]
pub struct PgLeaseStore {
    pool: PgPool,
}

impl PgLeaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Lease store database error");
    CoreError::Internal(err.to_string())
}

#[async_trait]
impl LeaseStore for PgLeaseStore {
    async fn apply(
        &self,
        project_id: DbId,
        request: &LeaseRequest,
    ) -> Result<Option<LeaseDecision>, CoreError> {
        ProjectLeaseRepo::apply(&self.pool, project_id, request)
            .await
            .map_err(internal)
    }

    async fn load(&self, project_id: DbId) -> Result<Option<LeaseSnapshot>, CoreError> {
        let row = ProjectLeaseRepo::load(&self.pool, project_id)
            .await
            .map_err(internal)?;
        Ok(row.map(|r| LeaseSnapshot {
            project_id,
            hold: r.hold(),
        }))
    }
}

#[async_trait]
impl Directory for PgLeaseStore {
    async fn profile(&self, user_id: DbId) -> Result<Option<UserProfile>, CoreError> {
        let user = UserRepo::find_by_id(&self.pool, user_id)
            .await
            .map_err(internal)?;
        Ok(user.map(UserProfile::from))
    }

    async fn is_member(&self, project_id: DbId, user_id: DbId) -> Result<bool, CoreError> {
        ProjectMemberRepo::is_member(&self.pool, project_id, user_id)
            .await
            .map_err(internal)
    }
}
