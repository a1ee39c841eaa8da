//! HTTP client for the upstream school-data API
//!
//! The upstream exposes three operations we care about: `POST /login`,
//! `GET /healthcheck` and `GET /api/`. Every call is bounded by a deadline;
//! when it expires the in-flight request is dropped and
//! [`UpstreamError::Timeout`] is returned.

use std::{future::Future, time::Duration};

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::{UpstreamError, UpstreamResult},
    retry::RetryPolicy,
};

/// Base URL used when none is configured
pub const DEFAULT_API_URL: &str = "https://api.home.pertermann.de";

/// Configuration for the upstream client
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API
    pub base_url: String,
    /// Deadline for login and healthcheck calls
    pub request_timeout: Duration,
    /// Deadline for the schedule fetch, retries included
    pub schedule_timeout: Duration,
    /// Retry policy for the schedule fetch
    pub retry: RetryPolicy,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            schedule_timeout: Duration::from_secs(10),
            retry: RetryPolicy::none(),
        }
    }
}

/// Credentials forwarded to the upstream login endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Result of a login attempt that reached the upstream
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Credentials accepted, carries the bearer token
    Granted(String),
    /// Upstream answered with a non-2xx status
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

/// Result of a schedule fetch that reached the upstream
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleFetch {
    /// The schedule payload, untouched
    Payload(Value),
    /// Upstream answered with a non-2xx status
    Rejected { status: StatusCode },
}

#[derive(Deserialize)]
struct LoginSuccess {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct LoginFailure {
    msg: Option<String>,
}

/// Upstream API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a new upstream client
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .build()
            .map_err(UpstreamError::Transport)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!("Upstream client initialized with URL: {}", base_url);

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for an access token
    pub async fn login(&self, credentials: &LoginCredentials) -> UpstreamResult<LoginOutcome> {
        let url = self.endpoint("/login");

        with_deadline(self.config.request_timeout, async {
            let response = self
                .http
                .post(&url)
                .json(credentials)
                .send()
                .await
                .map_err(UpstreamError::Transport)?;

            let status = response.status();
            if !status.is_success() {
                // an unreadable error body only loses the message, not the status
                let message = response
                    .json::<LoginFailure>()
                    .await
                    .ok()
                    .and_then(|body| body.msg);
                return Ok(LoginOutcome::Rejected { status, message });
            }

            let body: LoginSuccess = response.json().await.map_err(UpstreamError::Decode)?;
            body.access_token
                .filter(|token| !token.is_empty())
                .map(LoginOutcome::Granted)
                .ok_or(UpstreamError::MissingToken)
        })
        .await
    }

    /// Probe the healthcheck endpoint with a bearer token
    ///
    /// Returns the upstream status; any 2xx means the token is valid.
    pub async fn healthcheck(&self, token: &str) -> UpstreamResult<StatusCode> {
        let url = self.endpoint("/healthcheck");

        with_deadline(self.config.request_timeout, async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(UpstreamError::Transport)?;
            Ok(response.status())
        })
        .await
    }

    /// Fetch the substitution schedule
    ///
    /// Retries server errors and transport failures according to the
    /// configured [`RetryPolicy`]; all attempts share one deadline.
    pub async fn fetch_schedule(&self, token: &str) -> UpstreamResult<ScheduleFetch> {
        let retry = self.config.retry;

        with_deadline(self.config.schedule_timeout, async {
            let mut attempt = 0;
            loop {
                match self.fetch_schedule_once(token).await {
                    Ok(ScheduleFetch::Rejected { status })
                        if RetryPolicy::is_retryable_status(status) && !retry.exhausted(attempt) =>
                    {
                        warn!("Upstream schedule fetch answered {}", status);
                    }
                    Err(e) if e.is_retryable() && !retry.exhausted(attempt) => {
                        warn!("Upstream schedule fetch failed: {}", e);
                    }
                    outcome => return outcome,
                }

                attempt += 1;
                let delay = retry.delay_for(attempt);
                info!("Retrying schedule fetch (attempt {}) in {:?}", attempt, delay);
                tokio::time::sleep(delay).await;
            }
        })
        .await
    }

    async fn fetch_schedule_once(&self, token: &str) -> UpstreamResult<ScheduleFetch> {
        let response = self
            .http
            .get(self.endpoint("/api/"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ScheduleFetch::Rejected { status });
        }

        let payload = response.json().await.map_err(UpstreamError::Decode)?;
        Ok(ScheduleFetch::Payload(payload))
    }
}

async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = UpstreamResult<T>>,
) -> UpstreamResult<T> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| UpstreamError::Timeout(deadline))?
}
