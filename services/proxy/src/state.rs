//! Application state shared across handlers

use std::sync::Arc;

use common::{ScheduleCache, UpstreamClient, UpstreamResult};

use crate::{config::ServiceConfig, session::SessionCookies};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub upstream: UpstreamClient,
    pub cache: ScheduleCache,
    pub cookies: SessionCookies,
}

impl AppState {
    /// Build the state from the service configuration
    pub fn new(config: ServiceConfig) -> UpstreamResult<Self> {
        let upstream = UpstreamClient::new(config.upstream_config())?;
        let cache = ScheduleCache::new(config.cache_ttl_secs);
        let cookies = SessionCookies::new(config.is_production());

        Ok(Self {
            config: Arc::new(config),
            upstream,
            cache,
            cookies,
        })
    }
}
