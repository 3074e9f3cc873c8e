pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects                                 list, create
/// /projects/{id}                            get, delete (owner)
/// /projects/{id}/members                    add member (owner)
/// /projects/{id}/lock                       lease status
/// /projects/{id}/lock/acquire               acquire edit lease
/// /projects/{id}/lock/renew                 heartbeat
/// /projects/{id}/lock/release               release edit lease
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/projects", project::router())
}
