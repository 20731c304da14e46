//! The [`RangeQueryCache`], which wraps a slow [`FeatureSource`] and serves
//! repeated, overlapping range queries from the last result per sequence.
//!
//! # Policy
//!
//! Each sequence has at most one cache entry: the window, zoom level and
//! results of the most recent query that went to the source. A query whose
//! window lies inside the cached window (at the same zoom) is answered from
//! the entry. Any other query goes to the source for the whole new window and
//! replaces the entry. Failed source queries leave the entry untouched.
//!
//! Results are returned sorted by start (ties in source order). Sources
//! that return start-sorted results, as indexed readers do, therefore see no
//! difference between cached and direct queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::{
    error::PeakViewError,
    filter::{FilterSettings, PassAll},
    ranges::{sorted::SortedIntervals, Interval},
    reporting::CacheStats,
    traits::{FeatureSource, FilterPredicate},
    Position,
};

/// The materialized result of one source query.
#[derive(Debug, Clone)]
struct CacheEntry<U> {
    start: Position,
    end: Position,
    zoom: i32,
    results: Arc<SortedIntervals<U>>,
}

impl<U> CacheEntry<U> {
    /// Whether the query window `[start, end]` at `zoom` can be answered from
    /// this entry.
    fn contains(&self, start: Position, end: Position, zoom: i32) -> bool {
        self.zoom == zoom && self.start <= start && end <= self.end
    }
}

type Slot<U> = Arc<Mutex<Option<CacheEntry<U>>>>;

/// A caching wrapper around a [`FeatureSource`].
///
/// The cache never changes what a query returns, only how often the source
/// is called. Optionally, results can be filtered through a
/// [`FilterPredicate`] under shared [`FilterSettings`]; cached entries
/// always hold the unfiltered source results, so threshold changes need no
/// invalidation here.
///
/// # Concurrency
///
/// Each sequence's entry has its own lock, held across the source query, so
/// queries on one sequence run one at a time while queries on different
/// sequences proceed in parallel.
pub struct RangeQueryCache<S: FeatureSource, F = PassAll> {
    source: S,
    entries: RwLock<HashMap<String, Slot<S::Data>>>,
    settings: Option<Arc<FilterSettings>>,
    predicate: F,
    stats: CacheStats,
}

impl<S: FeatureSource, F> std::fmt::Debug for RangeQueryCache<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n_entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("RangeQueryCache")
            .field("entries", &n_entries)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl<S: FeatureSource> RangeQueryCache<S, PassAll> {
    /// Create a new unfiltered cache over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            settings: None,
            predicate: PassAll,
            stats: CacheStats::default(),
        }
    }
}

impl<S, F> RangeQueryCache<S, F>
where
    S: FeatureSource,
    F: FilterPredicate<S::Data>,
{
    /// Create a new cache over `source` whose results are filtered by
    /// `predicate` under `settings`.
    pub fn with_filter(source: S, settings: Arc<FilterSettings>, predicate: F) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            settings: Some(settings),
            predicate,
            stats: CacheStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn slot(&self, seqname: &str) -> Slot<S::Data> {
        if let Some(slot) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(seqname)
        {
            return Arc::clone(slot);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(seqname.to_string()).or_default())
    }

    /// The window and zoom level currently cached for `seqname`, if any.
    pub fn cached_window(&self, seqname: &str) -> Option<(Position, Position, i32)> {
        let slot = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(seqname)
            .map(Arc::clone)?;
        let entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        entry.as_ref().map(|e| (e.start, e.end, e.zoom))
    }

    /// Drop all cache entries, e.g. after the underlying data changed.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Features on `seqname` overlapping `[start, end]` at `zoom`.
    ///
    /// An empty window (`end < start`) returns no features without calling
    /// the source. Source errors are returned unchanged.
    pub fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<S::Data>>, PeakViewError> {
        if end < start {
            return Ok(Vec::new());
        }

        let slot = self.slot(seqname);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let results = match entry.as_ref() {
            Some(cached) if cached.contains(start, end, zoom) => {
                self.stats.record_cache_hit();
                debug!(seqname, start, end, zoom, "range cache hit");
                cached.results.overlapping(start, end).cloned().collect()
            }
            _ => {
                self.stats.record_source_query();
                debug!(seqname, start, end, zoom, "range cache miss");
                let fetched = SortedIntervals::new(self.source.query(seqname, start, end, zoom)?);
                let results = fetched.as_slice().to_vec();
                *entry = Some(CacheEntry {
                    start,
                    end,
                    zoom,
                    results: Arc::new(fetched),
                });
                results
            }
        };
        drop(entry);

        Ok(self.apply_filter(results))
    }

    fn apply_filter(&self, mut results: Vec<Interval<S::Data>>) -> Vec<Interval<S::Data>> {
        if let Some(settings) = &self.settings {
            let state = settings.state();
            // permissive thresholds: return the source's results as they are
            if !self.predicate.is_pass_through(&state) {
                results.retain(|iv| self.predicate.passes(iv.data(), &state));
            }
        }
        results
    }
}

impl<S, F> FeatureSource for RangeQueryCache<S, F>
where
    S: FeatureSource,
    F: FilterPredicate<S::Data>,
{
    type Data = S::Data;

    fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<Self::Data>>, PeakViewError> {
        RangeQueryCache::query(self, seqname, start, end, zoom)
    }

    fn data_min(&self) -> f64 {
        self.source.data_min()
    }

    fn data_max(&self) -> f64 {
        self.source.data_max()
    }
}
