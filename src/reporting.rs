//! Counters and reports about query and filtering work.
//!
//! [`CacheStats`] counts the expensive operations (filter scans, external
//! source queries) and the queries answered from cache. [`Report`] collects
//! messages for the user of a command, e.g. how many records were filtered
//! out or skipped.
//!

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters of cache activity.
#[derive(Debug, Default)]
pub struct CacheStats {
    filter_scans: AtomicU64,
    source_queries: AtomicU64,
    cache_hits: AtomicU64,
}

/// A point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Number of full scans building a filtered list.
    pub filter_scans: u64,
    /// Number of calls made to an external feature source.
    pub source_queries: u64,
    /// Number of range queries answered from a cache entry.
    pub cache_hits: u64,
}

impl CacheStats {
    pub(crate) fn record_filter_scan(&self) {
        self.filter_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_source_query(&self) {
        self.source_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            filter_scans: self.filter_scans.load(Ordering::Relaxed),
            source_queries: self.source_queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// The [`CommandOutput<U>`] type output is generic over some data output
/// from a command, and a [`Report`] that reports information to the user.
#[derive(Debug)]
pub struct CommandOutput<U> {
    pub value: U,
    pub report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }
}

/// A type to (semi) standardize reporting to the user.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.entries.push(message)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
