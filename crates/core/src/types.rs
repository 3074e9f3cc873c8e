use serde::{Deserialize, Serialize};

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Display identity of a user, as resolved by the user directory.
///
/// This is what other collaborators see when a project is locked: the lease
/// itself only stores the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: DbId,
    pub name: String,
    pub email: String,
}
