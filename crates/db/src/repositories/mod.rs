//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. [`PgLeaseStore`] adapts
//! them to the lease engine's store and directory traits.

pub mod project_lease_repo;
pub mod project_member_repo;
pub mod project_repo;
pub mod user_repo;

pub use project_lease_repo::{PgLeaseStore, ProjectLeaseRepo};
pub use project_member_repo::ProjectMemberRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
