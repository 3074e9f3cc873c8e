//! HTTP client for the project and lock endpoints.
//!
//! Wraps the `/api/v1` surface the presence side needs using [`reqwest`].
//! Error bodies are decoded into [`ClientError`] so callers can tell
//! contention, a lost lease and authorization failures apart.

use assess_core::lease::CurrentlyEditing;
use assess_core::types::{DbId, Timestamp};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A project as listed by `GET /api/v1/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectListing {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub currently_editing: Option<CurrentlyEditing>,
}

/// The active lease returned by `GET /api/v1/projects/{id}/lock`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LockStatus {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub since: Timestamp,
    pub last_edit_ping: Timestamp,
}

/// Contact details of the user holding a lease.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HolderContact {
    pub name: String,
    pub email: String,
}

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Someone else is editing the project. Retry later.
    #[error("Project is being edited by {} since {since}", .holder.name)]
    Locked {
        holder: HolderContact,
        since: Timestamp,
    },

    /// A renew was rejected: this client no longer holds the lease.
    #[error("Edit lock lost")]
    NotLockOwner,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response.
    #[error("Unexpected API response ({status}): {body}")]
    Unexpected { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// JSON error body produced by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
    holder: Option<HolderContact>,
    since: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Map a non-2xx status and its raw body to a [`ClientError`].
fn classify_error(status: u16, raw: String) -> ClientError {
    let Ok(body) = serde_json::from_str::<ErrorBody>(&raw) else {
        return ClientError::Unexpected { status, body: raw };
    };

    match (status, body.code.as_str()) {
        (423, _) => match (body.holder, body.since) {
            (Some(holder), Some(since)) => ClientError::Locked { holder, since },
            _ => ClientError::Unexpected { status, body: raw },
        },
        (403, "NOT_LOCK_OWNER") => ClientError::NotLockOwner,
        (403, _) => ClientError::Forbidden(body.error),
        (404, _) => ClientError::NotFound(body.error),
        (401, _) => ClientError::Unauthorized(body.error),
        _ => ClientError::Unexpected { status, body: raw },
    }
}

/// Authenticated client for one API server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    /// * `base_url` - Server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, access_token)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// `GET /api/v1/projects`
    pub async fn list_projects(&self) -> Result<Vec<ProjectListing>, ClientError> {
        let response = self.get("/api/v1/projects").await?;
        Self::parse_data(response).await
    }

    /// `POST /api/v1/projects/{id}/lock/acquire`
    pub async fn acquire(&self, project_id: DbId) -> Result<(), ClientError> {
        self.lock_action(project_id, "acquire").await
    }

    /// `POST /api/v1/projects/{id}/lock/renew`
    pub async fn renew(&self, project_id: DbId) -> Result<(), ClientError> {
        self.lock_action(project_id, "renew").await
    }

    /// `POST /api/v1/projects/{id}/lock/release`
    pub async fn release(&self, project_id: DbId) -> Result<(), ClientError> {
        self.lock_action(project_id, "release").await
    }

    /// `GET /api/v1/projects/{id}/lock`
    pub async fn lock_status(&self, project_id: DbId) -> Result<Option<LockStatus>, ClientError> {
        let response = self
            .get(&format!("/api/v1/projects/{project_id}/lock"))
            .await?;
        Self::parse_data(response).await
    }

    // ---- private helpers ----

    async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(response)
    }

    async fn lock_action(&self, project_id: DbId, action: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v1/projects/{project_id}/lock/{action}",
                self.base_url
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::ensure_success(response).await.map(|_| ())
    }

    /// Return the response on 2xx, otherwise decode the error body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(classify_error(status.as_u16(), body))
    }

    /// Check the status, then unwrap a `{ "data": T }` envelope.
    async fn parse_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}
