//! Repository for the `projects` table.

use assess_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, ProjectWithHolder};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_user_id, name, description, editing_by_user_id, \
                       editing_since, last_edit_ping, created_at, updated_at";

/// Same columns qualified with the `p` alias, plus the holder's name.
const HOLDER_COLUMNS: &str = "p.id, p.owner_user_id, p.name, p.description, \
                              p.editing_by_user_id, p.editing_since, p.last_edit_ping, \
                              p.created_at, p.updated_at, u.name AS holder_name";

/// Visibility filter: caller (`$1`) owns the project or is a member.
const VISIBLE_TO: &str = "p.deleted_at IS NULL AND (p.owner_user_id = $1 OR EXISTS ( \
                          SELECT 1 FROM project_members m \
                          WHERE m.project_id = p.id AND m.user_id = $1))";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_user_id`. Lease columns start empty.
    pub async fn create(
        pool: &PgPool,
        owner_user_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (owner_user_id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_user_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project visible to `user_id`, with its lease holder's name.
    pub async fn find_visible(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<ProjectWithHolder>, sqlx::Error> {
        let query = format!(
            "SELECT {HOLDER_COLUMNS} FROM projects p \
             LEFT JOIN users u ON u.id = p.editing_by_user_id \
             WHERE {VISIBLE_TO} AND p.id = $2"
        );
        sqlx::query_as::<_, ProjectWithHolder>(&query)
            .bind(user_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the projects visible to `user_id`, most recently created first.
    pub async fn list_visible(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ProjectWithHolder>, sqlx::Error> {
        let query = format!(
            "SELECT {HOLDER_COLUMNS} FROM projects p \
             LEFT JOIN users u ON u.id = p.editing_by_user_id \
             WHERE {VISIBLE_TO} \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, ProjectWithHolder>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete a project by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
