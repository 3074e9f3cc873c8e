//! Handlers for the project edit lease.
//!
//! At most one member edits a project at a time. The editor acquires the
//! lease when opening the project, renews it on a heartbeat and releases it
//! on close. A lease whose last heartbeat is older than the TTL is treated as
//! vacant, so a closed tab never blocks the project for long.

use assess_core::lease::{AcquireOutcome, ActiveLease, RenewOutcome};
use assess_core::types::DbId;
use axum::extract::{Path, State};
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, LockAck};
use crate::state::AppState;

/// POST /api/v1/projects/{id}/lock/acquire
///
/// Grants the lease if it is vacant, expired, or already held by the caller.
/// Returns 423 with the holder's name and email otherwise.
pub async fn acquire(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<LockAck>> {
    match state.leases.acquire(project_id, auth.user_id).await? {
        AcquireOutcome::Granted { since } => {
            tracing::info!(
                user_id = auth.user_id,
                project_id,
                %since,
                "Edit lock acquired"
            );
            Ok(Json(LockAck::ok()))
        }
        AcquireOutcome::Denied(holder) => {
            tracing::info!(
                user_id = auth.user_id,
                project_id,
                holder_id = holder.user_id,
                "Edit lock denied, project is being edited"
            );
            Err(AppError::Locked(holder))
        }
    }
}

/// POST /api/v1/projects/{id}/lock/renew
///
/// Heartbeat from the current holder. Anyone else gets 403 `not_lock_owner`
/// and the stored lease is left untouched.
pub async fn renew(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<LockAck>> {
    match state.leases.renew(project_id, auth.user_id).await? {
        RenewOutcome::Renewed => {
            tracing::debug!(user_id = auth.user_id, project_id, "Edit lock renewed");
            Ok(Json(LockAck::ok()))
        }
        RenewOutcome::NotLockOwner => {
            tracing::info!(
                user_id = auth.user_id,
                project_id,
                "Renew rejected, caller does not hold the edit lock"
            );
            Err(AppError::NotLockOwner)
        }
    }
}

/// POST /api/v1/projects/{id}/lock/release
///
/// Always answers `{ "ok": true }`. The lease is only cleared when the caller
/// is the holder.
pub async fn release(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<LockAck>> {
    let cleared = state.leases.release(project_id, auth.user_id).await?;
    if cleared {
        tracing::info!(user_id = auth.user_id, project_id, "Edit lock released");
    } else {
        tracing::debug!(
            user_id = auth.user_id,
            project_id,
            "Release ignored, caller does not hold the edit lock"
        );
    }
    Ok(Json(LockAck::ok()))
}

/// GET /api/v1/projects/{id}/lock
///
/// The active lease, or `null` when vacant or expired. Visible to members only.
pub async fn get_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<ActiveLease>>>> {
    super::project::ensure_visible(&state, auth.user_id, project_id).await?;
    let lease = state.leases.status(project_id).await?;
    Ok(Json(DataResponse { data: lease }))
}
