//! Client-side core of the parlour staff dashboard: session tracking,
//! cached remote data with request de-duplication, live attendance
//! updates over WebSocket and role-based route guarding.
//!
//! [`ParlourClient`] is the entry point; everything below it is public for
//! embedders that need finer control (a bare [`cache::QueryCache`], the
//! guard rules, the raw resource calls).

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod live;
pub mod model;
pub mod session;
pub mod validate;

pub use client::{DashboardStats, ParlourClient};
pub use config::Config;
pub use error::ClientError;
