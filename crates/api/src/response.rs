//! Shared response envelope types for API handlers.
//!
//! Resource reads use a `{ "data": ... }` envelope; lock actions answer with
//! a bare `{ "ok": true }` acknowledgement.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "ok": true }` body returned by acquire, renew and release.
#[derive(Debug, Serialize)]
pub struct LockAck {
    pub ok: bool,
}

impl LockAck {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
