//! Short-TTL response cache
//!
//! Memoizes fetch results so rapid dashboard refreshes and repeated CSV
//! exports do not hammer the upstream API. The cache is an explicitly owned
//! object constructed once per fetcher and passed by reference; the clock
//! and TTL are injectable so expiry is deterministic under test.
//!
//! Uses DashMap for lock-free concurrent access. There is deliberately no
//! single-flight coalescing: two concurrent fetches for the same key may
//! both miss, both hit the upstream, and both write; last write wins.

use callscope_core::{FetchParams, ReportKind, ReportPage, Tenant};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache discriminator: the full parameter set.
///
/// `max_rows`, `start_key` and the passthrough filters all participate, so
/// a capped or mid-pagination fetch can never collide with a full-window
/// fetch for the same report and tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ReportKind,
    pub tenant: Tenant,
    pub params: FetchParams,
}

struct CacheEntry {
    page: ReportPage,
    expires_at: Instant,
}

/// TTL memoization of fetch results.
pub struct ReportCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    /// Counter for operations since last cleanup (for periodic cleanup)
    ops_since_cleanup: AtomicUsize,
    cleanup_threshold: usize,
}

impl ReportCache {
    /// Create a cache with the default 5-minute TTL and the system clock
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL and the system clock
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_ttl_and_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with a custom TTL and clock
    pub fn with_ttl_and_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            ops_since_cleanup: AtomicUsize::new(0),
            cleanup_threshold: 64,
        }
    }

    /// Look up a live entry, returning a caller-owned copy.
    ///
    /// An expired entry is treated as a miss; the read itself does not
    /// evict it (periodic cleanup does).
    pub fn get(&self, key: &CacheKey) -> Option<ReportPage> {
        self.maybe_cleanup();

        self.entries.get(key).and_then(|entry| {
            if self.clock.now() < entry.expires_at {
                Some(entry.page.clone())
            } else {
                None
            }
        })
    }

    /// Store a fetch result, unconditionally overwriting any previous entry
    pub fn set(&self, key: CacheKey, page: ReportPage) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key, CacheEntry { page, expires_at });
        self.maybe_cleanup();
    }

    /// Maybe trigger cleanup based on operation count
    fn maybe_cleanup(&self) {
        let ops = self.ops_since_cleanup.fetch_add(1, Ordering::Relaxed);
        if ops >= self.cleanup_threshold {
            self.ops_since_cleanup.store(0, Ordering::Relaxed);
            self.cleanup_expired();
        }
    }

    /// Drop expired entries so the map does not grow without bound
    fn cleanup_expired(&self) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    /// Number of stored entries, expired included until cleanup runs
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Force immediate cleanup (for testing)
    #[cfg(test)]
    pub fn force_cleanup(&self) {
        self.cleanup_expired();
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}
