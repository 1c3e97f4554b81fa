pub mod attendance;
pub mod auth;
pub mod employee;
pub mod http;
pub mod task;

pub use http::{ApiClient, ApiEnvelope};
