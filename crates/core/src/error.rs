//! Domain error type shared by every layer.
//!
//! A denied acquire is an outcome
//! ([`crate::lease::AcquireOutcome::Denied`]), not an error.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing (or soft-deleted) project.
    pub fn project_not_found(id: DbId) -> Self {
        CoreError::NotFound {
            entity: "Project",
            id,
        }
    }
}
