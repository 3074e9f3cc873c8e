use std::sync::Arc;

use assess_core::clock::Clock;
use assess_core::lease::LeaseEngine;
use assess_db::repositories::PgLeaseStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: assess_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Project edit-lease engine.
    pub leases: Arc<LeaseEngine>,
}

impl AppState {
    /// Wire the lease engine to the database with the given clock.
    ///
    /// The server passes `SystemClock`; tests pass a `ManualClock` to move
    /// time past the lease TTL.
    pub fn new(pool: assess_db::DbPool, config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(PgLeaseStore::new(pool.clone()));
        let leases = LeaseEngine::new(store.clone(), store, clock).with_ttl(config.lock_ttl());
        Self {
            pool,
            config: Arc::new(config),
            leases: Arc::new(leases),
        }
    }
}
