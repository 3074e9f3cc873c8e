use std::time::Duration;

use assess_core::error::CoreError;

use crate::cache::DEFAULT_GRACE_MS;

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Presence client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Server root, e.g. `http://localhost:3000`.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub access_token: String,
    /// Time between project-list polls.
    pub poll_interval: Duration,
    /// How long a cached editor outlives the last poll that reported it.
    pub grace: Duration,
}

impl PresenceConfig {
    /// Build a configuration, checking that the grace window is longer than
    /// the poll interval. A window no longer than one interval would let a
    /// single late poll blank the indicator.
    pub fn new(
        api_base_url: String,
        access_token: String,
        poll_interval: Duration,
        grace: Duration,
    ) -> Result<Self, CoreError> {
        if poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }
        if grace <= poll_interval {
            return Err(CoreError::Validation(format!(
                "grace window ({} ms) must be longer than the poll interval ({} ms)",
                grace.as_millis(),
                poll_interval.as_millis()
            )));
        }
        Ok(Self {
            api_base_url,
            access_token,
            poll_interval,
            grace,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Required | Default |
    /// |---------------------|----------|---------|
    /// | `API_BASE_URL`      | **yes**  | --      |
    /// | `ACCESS_TOKEN`      | **yes**  | --      |
    /// | `POLL_INTERVAL_MS`  | no       | `1000`  |
    /// | `PRESENCE_GRACE_MS` | no       | `6000`  |
    ///
    /// # Panics
    ///
    /// Panics on missing required variables, unparseable numbers, or a grace
    /// window not longer than the poll interval.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("API_BASE_URL").expect("API_BASE_URL must be set");
        let access_token = std::env::var("ACCESS_TOKEN").expect("ACCESS_TOKEN must be set");

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_MS.to_string())
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");

        let grace_ms: u64 = std::env::var("PRESENCE_GRACE_MS")
            .unwrap_or_else(|_| DEFAULT_GRACE_MS.to_string())
            .parse()
            .expect("PRESENCE_GRACE_MS must be a valid u64");

        Self::new(
            api_base_url,
            access_token,
            Duration::from_millis(poll_interval_ms),
            Duration::from_millis(grace_ms),
        )
        .unwrap_or_else(|e| panic!("Invalid presence configuration: {e}"))
    }

    /// The grace window as a `chrono` duration, for timestamp arithmetic.
    pub fn grace_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.grace.as_millis() as i64)
    }
}
