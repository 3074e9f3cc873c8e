//! Domain crate for the assessment backend.
//!
//! Has no internal dependencies so the database layer, the HTTP server and
//! the presence client can all share the same lease rules and types.

pub mod clock;
pub mod error;
pub mod lease;
pub mod types;
