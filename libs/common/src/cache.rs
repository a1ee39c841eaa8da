//! In-memory schedule cache
//!
//! This module provides the single-slot cache that sits in front of the
//! upstream schedule endpoint. There is exactly one entry for the whole
//! process; it is not keyed by user or session.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Default time-to-live of a cache entry in seconds (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Current unix time in whole seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// A cached schedule payload
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Opaque upstream payload
    pub data: Arc<Value>,
    /// Unix seconds at which the payload was fetched
    pub timestamp: i64,
}

impl CacheEntry {
    /// Whether the entry is still usable at `now` for the given TTL
    pub fn is_fresh_at(&self, now: i64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.timestamp) < ttl_secs as i64
    }
}

/// Process-wide schedule cache
///
/// Reads and replacements of the slot are atomic. Nothing serializes the
/// read-then-write sequence of concurrent callers, so the last writer wins.
#[derive(Debug, Clone)]
pub struct ScheduleCache {
    ttl_secs: u64,
    slot: Arc<RwLock<Option<CacheEntry>>>,
}

impl Default for ScheduleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_SECS)
    }
}

impl ScheduleCache {
    /// Create an empty cache
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Configured time-to-live in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Return the entry if it is still fresh at `now`
    pub async fn get_fresh(&self, now: i64) -> Option<CacheEntry> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.is_fresh_at(now, self.ttl_secs))
            .cloned()
    }

    /// Return the current entry regardless of its age
    pub async fn peek(&self) -> Option<CacheEntry> {
        self.slot.read().await.clone()
    }

    /// Replace the entry with a new payload
    pub async fn store(&self, data: Value, timestamp: i64) -> CacheEntry {
        let entry = CacheEntry {
            data: Arc::new(data),
            timestamp,
        };
        *self.slot.write().await = Some(entry.clone());
        debug!("Schedule cache updated at {}", timestamp);
        entry
    }
}
