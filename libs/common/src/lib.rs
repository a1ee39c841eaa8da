//! Common library for the Vertretungsplan proxy
//!
//! This crate provides the infrastructure pieces used by the proxy service:
//! the upstream API client, its retry policy and error types, and the
//! in-memory schedule cache.

pub mod cache;
pub mod error;
pub mod retry;
pub mod upstream;

pub use cache::{CacheEntry, ScheduleCache};
pub use error::{UpstreamError, UpstreamResult};
pub use retry::RetryPolicy;
pub use upstream::{
    DEFAULT_API_URL, LoginCredentials, LoginOutcome, ScheduleFetch, UpstreamClient,
    UpstreamConfig,
};

/// Example usage of the upstream client
///
/// ```rust,no_run
/// use common::{ScheduleFetch, UpstreamClient, UpstreamConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = UpstreamClient::new(UpstreamConfig::default())?;
///     if let ScheduleFetch::Payload(schedule) = client.fetch_schedule("token").await? {
///         println!("Schedule created at {}", schedule["createdAt"]);
///     }
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
