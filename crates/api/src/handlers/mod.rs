pub mod lock;
pub mod project;
