//! Service configuration

use std::time::Duration;

use anyhow::Result;
use common::{DEFAULT_API_URL, RetryPolicy, UpstreamConfig, cache::DEFAULT_CACHE_TTL_SECS};
use ::config::{Config, Environment};
use serde::Deserialize;

/// Prefix of every environment variable read by the service
pub const ENV_PREFIX: &str = "VERTRETUNG";

/// Proxy service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the upstream school-data API
    pub api_url: String,
    /// Address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment, `production` enables secure cookies
    pub environment: String,
    /// Lifetime of the schedule cache entry in seconds
    pub cache_ttl_secs: u64,
    /// Deadline for the upstream schedule fetch in seconds
    pub schedule_timeout_secs: u64,
    /// Deadline for upstream login and healthcheck calls in seconds
    pub request_timeout_secs: u64,
    /// Retries of a failed schedule fetch
    pub upstream_max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_base_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            schedule_timeout_secs: 10,
            request_timeout_secs: 10,
            upstream_max_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ServiceConfig {
    /// Create a new ServiceConfig from environment variables
    ///
    /// # Environment Variables
    /// - `VERTRETUNG_API_URL`: Upstream base URL (default: "https://api.home.pertermann.de")
    /// - `VERTRETUNG_HOST`: Bind address (default: "0.0.0.0")
    /// - `VERTRETUNG_PORT`: Listen port (default: 3000)
    /// - `VERTRETUNG_ENVIRONMENT`: "production" or anything else (default: "development")
    /// - `VERTRETUNG_CACHE_TTL_SECS`: Schedule cache TTL (default: 300)
    /// - `VERTRETUNG_SCHEDULE_TIMEOUT_SECS`: Schedule fetch deadline (default: 10)
    /// - `VERTRETUNG_REQUEST_TIMEOUT_SECS`: Login/healthcheck deadline (default: 10)
    /// - `VERTRETUNG_UPSTREAM_MAX_RETRIES`: Schedule fetch retries (default: 0)
    /// - `VERTRETUNG_RETRY_BASE_DELAY_MS`: First retry delay (default: 1000)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("environment", defaults.environment)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs as i64)?
            .set_default("schedule_timeout_secs", defaults.schedule_timeout_secs as i64)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("upstream_max_retries", i64::from(defaults.upstream_max_retries))?
            .set_default("retry_base_delay_ms", defaults.retry_base_delay_ms as i64)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Whether the service runs in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Socket address to listen on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream client configuration derived from this config
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            schedule_timeout: Duration::from_secs(self.schedule_timeout_secs),
            retry: RetryPolicy::new(
                self.upstream_max_retries,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        }
    }
}
