// ABOUTME: Time-based in-memory cache for expensive platform-wide aggregations
// ABOUTME: Single-slot TTL cache guarded by a tokio RwLock, read-heavy access pattern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// A single cached value with a fixed time-to-live.
///
/// Used for platform-wide statistics that scan the whole log table. Stale
/// reads within the TTL window are acceptable for these aggregates.
pub struct TtlCache<T> {
    slot: RwLock<Option<Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    /// Create an empty cache with the given TTL in seconds
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Return the cached value if present and not expired
    pub async fn get(&self) -> Option<T> {
        let guard = self.slot.read().await;
        match guard.as_ref() {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Store a value, resetting the expiry clock
    pub async fn put(&self, value: T) {
        let mut guard = self.slot.write().await;
        *guard = Some(Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// Drop the cached value
    pub async fn invalidate(&self) {
        let mut guard = self.slot.write().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_value_within_ttl() {
        let cache = TtlCache::new(60);
        assert!(cache.get().await.is_none());

        cache.put(42_i64).await;
        assert_eq!(cache.get().await, Some(42));
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = TtlCache::new(0);
        cache.put("stale".to_owned()).await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn invalidate_clears_slot() {
        let cache = TtlCache::new(60);
        cache.put(1_i64).await;
        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }
}
