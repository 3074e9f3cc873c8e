//! Handlers for projects visible to the caller.
//!
//! A project is visible to its owner and to every member it was shared with.
//! Listings embed a `currently_editing` projection of the edit lease, derived
//! at read time from the lease columns.

use assess_core::error::CoreError;
use assess_core::lease::CurrentlyEditing;
use assess_core::types::{DbId, Timestamp};
use assess_db::models::project::{AddProjectMember, CreateProject, ProjectWithHolder};
use assess_db::repositories::{ProjectMemberRepo, ProjectRepo, UserRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A project as returned to clients.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: DbId,
    pub owner_user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currently_editing: Option<CurrentlyEditing>,
}

impl ProjectSummary {
    fn build(state: &AppState, row: ProjectWithHolder) -> Self {
        let hold = row.project.lease_hold();
        let currently_editing = state
            .leases
            .currently_editing(hold.as_ref(), row.holder_name.as_deref());
        let p = row.project;
        Self {
            id: p.id,
            owner_user_id: p.owner_user_id,
            name: p.name,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
            currently_editing,
        }
    }
}

/// Load a project the caller can see, or 404.
///
/// Non-members get the same 404 as a missing project.
pub(crate) async fn ensure_visible(
    state: &AppState,
    user_id: DbId,
    project_id: DbId,
) -> AppResult<ProjectWithHolder> {
    ProjectRepo::find_visible(&state.pool, user_id, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::project_not_found(project_id)))
}

/// Load a project the caller owns. 404 if missing, 403 if not the owner.
async fn ensure_owner(state: &AppState, user_id: DbId, project_id: DbId) -> AppResult<()> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::project_not_found(project_id)))?;
    if project.owner_user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner can do this".into(),
        )));
    }
    Ok(())
}

/// GET /api/v1/projects
pub async fn list_projects(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ProjectSummary>>>> {
    let rows = ProjectRepo::list_visible(&state.pool, auth.user_id).await?;
    let data = rows
        .into_iter()
        .map(|row| ProjectSummary::build(&state, row))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectSummary>>> {
    let row = ensure_visible(&state, auth.user_id, project_id).await?;
    Ok(Json(DataResponse {
        data: ProjectSummary::build(&state, row),
    }))
}

/// POST /api/v1/projects
///
/// The caller becomes the owner. Returns 201 with the new project.
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::BadRequest("Project name must not be empty".into()));
    }

    let project = ProjectRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(user_id = auth.user_id, project_id = project.id, "Project created");

    let row = ProjectWithHolder {
        project,
        holder_name: None,
    };
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProjectSummary::build(&state, row),
        }),
    ))
}

/// DELETE /api/v1/projects/{id}
///
/// Soft-deletes the project. Owner only.
pub async fn delete_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<StatusCode> {
    ensure_owner(&state, auth.user_id, project_id).await?;
    ProjectRepo::soft_delete(&state.pool, project_id).await?;
    tracing::info!(user_id = auth.user_id, project_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/members
///
/// Shares the project with another user. Owner only. Adding an existing
/// member is a no-op.
pub async fn add_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AddProjectMember>,
) -> AppResult<StatusCode> {
    ensure_owner(&state, auth.user_id, project_id).await?;

    if UserRepo::find_active_by_id(&state.pool, input.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }));
    }

    let added = ProjectMemberRepo::add(&state.pool, project_id, input.user_id).await?;
    if added {
        tracing::info!(
            user_id = auth.user_id,
            project_id,
            member_id = input.user_id,
            "Project shared"
        );
    }
    Ok(StatusCode::NO_CONTENT)
}
