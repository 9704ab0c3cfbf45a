//! In-memory quote cache
//!
//! Caches price breakdowns so repeated quotes for the same selection skip the
//! calculation. Entries are whole breakdowns produced by `calculate`; the cache
//! never derives or adjusts totals.

use crewbill_common::{PriceBreakdown, SelectionState};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Cache key components
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    catalog_version: u64,
    feature_ids: Vec<String>,
    user_count: u32,
    billing_period: &'static str,
}

impl CacheKey {
    fn new(catalog_version: u64, selection: &SelectionState) -> Self {
        Self {
            catalog_version,
            // BTreeSet iteration is sorted, so equal selections give equal keys
            feature_ids: selection
                .selected_feature_ids
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            user_count: selection.user_count,
            billing_period: selection.billing_period.as_str(),
        }
    }

    fn to_cache_key(&self, prefix: &str) -> String {
        let hash = blake3::hash(
            format!(
                "{}:{}:{}:{}",
                self.catalog_version,
                self.feature_ids.join(","),
                self.user_count,
                self.billing_period
            )
            .as_bytes(),
        );
        format!("{}:quote:{}", prefix, hash.to_hex())
    }
}

/// Cached breakdown with metadata
#[derive(Debug, Clone)]
struct CachedQuote {
    breakdown: PriceBreakdown,
    /// Insertion order, used to find the oldest entries
    sequence: u64,
    expires_at: i64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries
    pub entry_count: u64,
    /// Entries past their TTL but not yet purged
    pub expired_count: u64,
}

/// Bounded, TTL-based quote cache using DashMap
///
/// When full, expired entries are purged; if none were expired, the oldest
/// tenth of the cache is evicted in one pass so inserts stay amortized O(1).
pub struct QuoteCache {
    cache: DashMap<String, CachedQuote>,
    prefix: String,
    max_entries: usize,
    ttl: Duration,
    next_sequence: AtomicU64,
}

impl QuoteCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            prefix: "crewbill".to_string(),
            max_entries,
            ttl,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Create cache with custom key prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Get a live cached breakdown for a selection
    pub fn get(&self, catalog_version: u64, selection: &SelectionState) -> Option<PriceBreakdown> {
        let key = CacheKey::new(catalog_version, selection).to_cache_key(&self.prefix);

        let entry = self.cache.get(&key)?;
        let now = chrono::Utc::now().timestamp_millis();
        if now < entry.expires_at {
            debug!(key = %key, "Cache hit");
            Some(entry.breakdown.clone())
        } else {
            debug!(key = %key, "Cache expired");
            None
        }
    }

    /// Cache a breakdown for a selection
    pub fn set(&self, catalog_version: u64, selection: &SelectionState, breakdown: &PriceBreakdown) {
        if self.max_entries == 0 {
            return;
        }

        if self.cache.len() >= self.max_entries {
            self.evict();
        }

        let key = CacheKey::new(catalog_version, selection).to_cache_key(&self.prefix);
        let now = chrono::Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);

        self.cache.insert(
            key,
            CachedQuote {
                breakdown: breakdown.clone(),
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
                expires_at: now.saturating_add(ttl_ms),
            },
        );
    }

    /// Make room for at least one entry
    fn evict(&self) {
        let now = chrono::Utc::now().timestamp_millis();
        let mut expired = Vec::new();
        let mut live = Vec::with_capacity(self.cache.len());
        for entry in self.cache.iter() {
            if now >= entry.expires_at {
                expired.push(entry.key().clone());
            } else {
                live.push((entry.sequence, entry.key().clone()));
            }
        }

        if !expired.is_empty() {
            debug!(evicted = expired.len(), "Purged expired quotes");
            for key in expired {
                self.cache.remove(&key);
            }
            return;
        }

        let batch = (self.max_entries / 10).clamp(1, live.len().max(1));
        if live.len() > batch {
            live.select_nth_unstable_by_key(batch - 1, |(sequence, _)| *sequence);
            live.truncate(batch);
        }
        debug!(evicted = live.len(), "Evicted oldest quotes");
        for (_, key) in live {
            self.cache.remove(&key);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let now = chrono::Utc::now().timestamp_millis();
        let expired = self
            .cache
            .iter()
            .filter(|entry| now >= entry.expires_at)
            .count();
        CacheStats {
            entry_count: self.cache.len() as u64,
            expired_count: expired as u64,
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
