//! Route definitions for projects and their edit lease.
//!
//! All endpoints require authentication via `AuthUser` extractor.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{lock, project};
use crate::state::AppState;

/// Project routes mounted at `/projects`.
///
/// ```text
/// GET    /                         -> list_projects
/// POST   /                         -> create_project
/// GET    /{id}                     -> get_project
/// DELETE /{id}                     -> delete_project
/// POST   /{id}/members             -> add_member
/// GET    /{id}/lock                -> lock::get_status
/// POST   /{id}/lock/acquire        -> lock::acquire
/// POST   /{id}/lock/renew          -> lock::renew
/// POST   /{id}/lock/release        -> lock::release
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(project::list_projects).post(project::create_project),
        )
        .route(
            "/{id}",
            get(project::get_project).delete(project::delete_project),
        )
        .route("/{id}/members", post(project::add_member))
        .route("/{id}/lock", get(lock::get_status))
        .route("/{id}/lock/acquire", post(lock::acquire))
        .route("/{id}/lock/renew", post(lock::renew))
        .route("/{id}/lock/release", post(lock::release))
}
