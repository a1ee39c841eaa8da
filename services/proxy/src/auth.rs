//! Session endpoints: login, logout and status check

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::extract::cookie::CookieJar;
use common::{LoginCredentials, LoginOutcome};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    session::Session,
    state::AppState,
};

/// Message used when upstream rejects a login without saying why
const LOGIN_FAILED: &str = "Login failed";

/// Response for login and logout
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response for the session status check
#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

/// Exchange credentials for a session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<SuccessResponse>)> {
    let Json(credentials) = payload.map_err(|e| {
        error!("Authentication error: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Login attempt for user: {}", credentials.username);

    match state.upstream.login(&credentials).await? {
        LoginOutcome::Granted(token) => {
            let jar = state.cookies.issue(jar, &Session::new(token));
            info!("Session issued for user: {}", credentials.username);
            Ok((jar, Json(SuccessResponse { success: true })))
        }
        LoginOutcome::Rejected { status, message } => {
            warn!(
                "Upstream rejected login for user {}: {}",
                credentials.username, status
            );
            Err(ApiError::Upstream {
                status,
                message: message.unwrap_or_else(|| LOGIN_FAILED.to_string()),
            })
        }
    }
}

/// Clear the session cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    info!("Logout request");

    (
        state.cookies.revoke(jar),
        Json(SuccessResponse { success: true }),
    )
}

/// Check whether the session cookie still holds a valid token
///
/// A token the upstream rejects is removed from the browser. A failed probe
/// reports "not authenticated" but keeps the cookie, since the token may still
/// be fine.
pub async fn status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<AuthStatusResponse>) {
    let Some(token) = state.cookies.token(&jar) else {
        return (jar, Json(AuthStatusResponse { authenticated: false }));
    };

    match state.upstream.healthcheck(&token).await {
        Ok(status) if status.is_success() => {
            (jar, Json(AuthStatusResponse { authenticated: true }))
        }
        Ok(status) => {
            info!("Upstream rejected session token ({}), clearing cookie", status);
            (
                state.cookies.revoke(jar),
                Json(AuthStatusResponse { authenticated: false }),
            )
        }
        Err(e) => {
            warn!("Session validation failed: {}", e);
            (jar, Json(AuthStatusResponse { authenticated: false }))
        }
    }
}
