//! Repository for the `project_members` table.

use assess_core::types::DbId;
use sqlx::PgPool;

/// Project sharing. The owner is always a member without a row here.
pub struct ProjectMemberRepo;

impl ProjectMemberRepo {
    /// Add a member. Returns `false` if the user was already a member.
    pub async fn add(pool: &PgPool, project_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (project_id, user_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `true` if the user owns the (non-deleted) project or is a member of it.
    pub async fn is_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM projects p \
                WHERE p.id = $1 AND p.deleted_at IS NULL \
                  AND (p.owner_user_id = $2 OR EXISTS ( \
                      SELECT 1 FROM project_members m \
                      WHERE m.project_id = p.id AND m.user_id = $2)) \
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}
