//! Cached proxy for the upstream substitution schedule

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use common::{CacheEntry, ScheduleCache, ScheduleFetch, UpstreamClient, cache::unix_now};
use tracing::{debug, info};

use crate::{error::ApiError, state::AppState};

/// How a schedule request ended
#[derive(Debug)]
pub enum ProxyOutcome {
    /// No session cookie, upstream was not contacted
    Unauthorized,
    /// Fresh cache entry returned without an upstream call
    Served(CacheEntry),
    /// Upstream payload fetched and written to the cache
    Refreshed(CacheEntry),
    /// Upstream rejected the token with 401 or 403
    SessionInvalidated,
    /// Any other failure, already translated for the client
    Failed(ApiError),
}

/// Serves the schedule from the cache or the upstream
pub struct ScheduleProxy<'a> {
    upstream: &'a UpstreamClient,
    cache: &'a ScheduleCache,
}

impl<'a> ScheduleProxy<'a> {
    pub fn new(upstream: &'a UpstreamClient, cache: &'a ScheduleCache) -> Self {
        Self { upstream, cache }
    }

    /// Resolve one request observed at `now` (unix seconds)
    ///
    /// Only a successful fetch writes the cache and only a 401/403 from
    /// upstream invalidates the session; the two never happen together.
    pub async fn serve(&self, token: Option<&str>, now: i64) -> ProxyOutcome {
        let Some(token) = token else {
            return ProxyOutcome::Unauthorized;
        };

        if let Some(entry) = self.cache.get_fresh(now).await {
            debug!("Serving substitutions from cache");
            return ProxyOutcome::Served(entry);
        }

        match self.upstream.fetch_schedule(token).await {
            Ok(ScheduleFetch::Payload(data)) => {
                info!("Fetched substitutions from upstream");
                ProxyOutcome::Refreshed(self.cache.store(data, now).await)
            }
            Ok(ScheduleFetch::Rejected { status })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                info!("Upstream rejected session token ({})", status);
                ProxyOutcome::SessionInvalidated
            }
            Ok(ScheduleFetch::Rejected { status }) => ProxyOutcome::Failed(fetch_failure(status)),
            Err(e) => ProxyOutcome::Failed(e.into()),
        }
    }
}

fn fetch_failure(status: StatusCode) -> ApiError {
    let reason = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string());

    ApiError::Upstream {
        status,
        message: format!("Failed to fetch data: {}", reason),
    }
}

fn schedule_response(entry: &CacheEntry, ttl_secs: u64) -> Response {
    (
        [(header::CACHE_CONTROL, format!("private, max-age={}", ttl_secs))],
        Json(&*entry.data),
    )
        .into_response()
}

/// Substitution schedule endpoint
pub async fn get_substitutions(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = state.cookies.token(&jar);
    let proxy = ScheduleProxy::new(&state.upstream, &state.cache);

    match proxy.serve(token.as_deref(), unix_now()).await {
        ProxyOutcome::Unauthorized => ApiError::Unauthorized.into_response(),
        ProxyOutcome::Served(entry) | ProxyOutcome::Refreshed(entry) => {
            schedule_response(&entry, state.cache.ttl_secs())
        }
        ProxyOutcome::SessionInvalidated => {
            (state.cookies.revoke(jar), ApiError::SessionExpired).into_response()
        }
        ProxyOutcome::Failed(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UpstreamConfig;
    use serde_json::json;

    fn unreachable_upstream() -> UpstreamClient {
        UpstreamClient::new(UpstreamConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..UpstreamConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn test_fetch_failure_message() {
        let error = fetch_failure(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.to_string(), "Failed to fetch data: Service Unavailable");
    }

    #[test]
    fn test_fetch_failure_message_for_unknown_status() {
        let status = StatusCode::from_u16(599).expect("valid status");
        let error = fetch_failure(status);
        assert_eq!(error.status(), status);
        assert_eq!(error.to_string(), "Failed to fetch data: 599");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let upstream = unreachable_upstream();
        let cache = ScheduleCache::new(300);
        cache.store(json!({"courses": {}}), unix_now()).await;

        let outcome = ScheduleProxy::new(&upstream, &cache)
            .serve(None, unix_now())
            .await;
        assert!(matches!(outcome, ProxyOutcome::Unauthorized));
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served_without_upstream() {
        let upstream = unreachable_upstream();
        let cache = ScheduleCache::new(300);
        cache.store(json!({"createdAt": "2024-01-08"}), 1_000).await;

        let outcome = ScheduleProxy::new(&upstream, &cache)
            .serve(Some("token"), 1_100)
            .await;
        match outcome {
            ProxyOutcome::Served(entry) => {
                assert_eq!(*entry.data, json!({"createdAt": "2024-01-08"}));
                assert_eq!(entry.timestamp, 1_000);
            }
            other => panic!("expected cache hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_internal_error() {
        let upstream = unreachable_upstream();
        let cache = ScheduleCache::new(300);

        let outcome = ScheduleProxy::new(&upstream, &cache)
            .serve(Some("token"), unix_now())
            .await;
        assert!(matches!(
            outcome,
            ProxyOutcome::Failed(ApiError::InternalServerError)
        ));
        assert!(cache.peek().await.is_none());
    }
}
