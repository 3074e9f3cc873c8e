//! Client side of the project edit lease.
//!
//! - [`client`] -- typed HTTP client for the project and lock endpoints.
//! - [`sequence`] -- sequence numbers that discard overtaken poll responses.
//! - [`cache`] -- grace-window cache that keeps the editor indicator steady.
//! - [`aggregator`] -- combines the two into the "who is editing" view.
//! - [`poller`] -- interval loop feeding the aggregator.
//! - [`session`] -- holds a lease open with heartbeats while a project is edited.

pub mod aggregator;
pub mod cache;
pub mod client;
pub mod config;
pub mod poller;
pub mod sequence;
pub mod session;
