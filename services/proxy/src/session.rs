//! Session cookie handling
//!
//! The session lives entirely in the `auth_token` cookie; the server keeps no
//! session state of its own.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use time::OffsetDateTime;

/// Name of the session cookie
pub const COOKIE_NAME: &str = "auth_token";

/// Session lifetime in seconds (7 days)
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// A session established by a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a freshly issued token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Utc::now(),
        }
    }

    /// Instant after which the browser drops the cookie
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(SESSION_MAX_AGE_SECS)
    }

    /// Remaining lifetime in whole seconds, as sent in `Max-Age`
    fn max_age_secs(&self) -> i64 {
        (self.expires_at() - self.issued_at).num_seconds()
    }
}

/// Encodes, reads and removes the session cookie
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    /// `secure` sets the cookie's Secure attribute
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Add the session cookie to the jar
    pub fn issue(&self, jar: CookieJar, session: &Session) -> CookieJar {
        let mut cookie = Cookie::build((COOKIE_NAME, session.token.clone()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(session.max_age_secs()));

        let expires_at = session.expires_at().timestamp();
        if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at) {
            cookie = cookie.expires(expires);
        }

        jar.add(cookie)
    }

    /// Bearer token carried by the request, if any
    ///
    /// Presence is all that is checked; an empty value is passed on as is.
    pub fn token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(COOKIE_NAME).map(|cookie| cookie.value().to_string())
    }

    /// Expire the session cookie in the browser
    ///
    /// The removal cookie is sent whether or not the request carried one.
    pub fn revoke(&self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::build((COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        cookie.make_removal();

        jar.add(cookie)
    }
}
