//! Session and caching proxy in front of the Vertretungsplan API
//!
//! The browser never talks to the upstream school-data API directly. This
//! service exchanges credentials for a bearer token kept in an HTTP-only
//! cookie, validates that cookie on demand, and proxies the substitution
//! schedule through a short-lived in-memory cache.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod substitutions;
