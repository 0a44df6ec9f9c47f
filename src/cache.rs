//! Match result caching
//!
//! This module provides caching for repeated pathname lookups with LRU
//! eviction policy. Matching is deterministic for a given index, so a cached
//! outcome stays valid for the index's lifetime; rebuild or clear the cache
//! when the index changes.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::RouterError;
use crate::matcher::{match_path_with_policy, MatchOutcome};
use crate::params::ParseErrorPolicy;
use crate::trace_log;
use crate::tree::RouteIndex;

/// Cache performance statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Pathname-to-outcome cache with LRU eviction
///
/// One cache belongs to one index and one codec failure policy; mixing
/// policies through the same cache would conflate their outcomes.
///
/// Default capacity: 1000 entries.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, MatchOutcome>,
    policy: ParseErrorPolicy,
    stats: CacheStats,
}

impl MatchCache {
    const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).expect("Cache capacity must be non-zero");
        Self {
            entries: LruCache::new(cap),
            policy: ParseErrorPolicy::Propagate,
            stats: CacheStats::default(),
        }
    }

    /// Set the codec failure policy used for cached lookups
    pub fn with_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing match cache");
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    pub fn get(&mut self, pathname: &str) -> Option<MatchOutcome> {
        if let Some(outcome) = self.entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for '{}'", pathname);
            Some(outcome.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for '{}'", pathname);
            None
        }
    }

    pub fn set(&mut self, pathname: String, outcome: MatchOutcome) {
        self.entries.push(pathname, outcome);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a pathname through the cache, falling back to a full walk on miss.
///
/// Codec failures are never cached: an `Err` from the walk propagates
/// without populating the entry.
pub fn match_path_cached(
    index: &RouteIndex,
    cache: &mut MatchCache,
    pathname: &str,
) -> Result<MatchOutcome, RouterError> {
    if let Some(outcome) = cache.get(pathname) {
        return Ok(outcome);
    }

    let outcome = match_path_with_policy(index, pathname, cache.policy)?;
    cache.set(pathname.to_string(), outcome.clone());
    Ok(outcome)
}
