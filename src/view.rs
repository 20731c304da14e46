//! Lazily filtered, per-sequence interval lists.
//!
//! A [`FilteredView`] owns the full [`SortedIntervals`] of every sequence and,
//! on demand, the subset passing its [`FilterPredicate`] under the current
//! [`FilterState`] of its shared [`FilterSettings`].
//!
//! # Concurrency
//!
//! The set of sequences is fixed when the view is built, and each sequence has
//! its own lock around its cached filtered list. Queries on different
//! sequences never wait on each other. For one sequence, the first caller
//! after an invalidation builds the list while later callers wait and reuse it.
//! Filtered lists are handed out as [`Arc`]s, so readers keep a consistent
//! list even if the thresholds change while they hold it.

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    filter::{FilterSettings, FilterState, ThresholdFilter},
    ranges::{group_by_seqname, sorted::SortedIntervals, Interval},
    reporting::CacheStats,
    traits::{FilterPredicate, Scored},
    Position,
};

struct FilteredEntry<U> {
    epoch: u64,
    list: Arc<SortedIntervals<U>>,
}

struct ViewSlot<U> {
    full: Arc<SortedIntervals<U>>,
    filtered: Mutex<Option<FilteredEntry<U>>>,
}

/// Per-sequence intervals with cached filtered subsets.
pub struct FilteredView<U, F = ThresholdFilter> {
    slots: IndexMap<String, ViewSlot<U>>,
    settings: Arc<FilterSettings>,
    predicate: F,
    stats: CacheStats,
}

impl<U, F> std::fmt::Debug for FilteredView<U, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredView")
            .field("sequences", &self.slots.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<U> FilteredView<U, ThresholdFilter>
where
    U: Clone + Scored,
{
    /// Build a new view over `intervals` using the default [`ThresholdFilter`].
    pub fn new<I>(intervals: I, settings: Arc<FilterSettings>) -> Self
    where
        I: IntoIterator<Item = Interval<U>>,
    {
        Self::with_predicate(intervals, settings, ThresholdFilter)
    }
}

impl<U, F> FilteredView<U, F>
where
    U: Clone,
    F: FilterPredicate<U>,
{
    /// Build a new view over `intervals`, grouping them by sequence name and
    /// sorting each group by start.
    pub fn with_predicate<I>(intervals: I, settings: Arc<FilterSettings>, predicate: F) -> Self
    where
        I: IntoIterator<Item = Interval<U>>,
    {
        let slots = group_by_seqname(intervals)
            .into_iter()
            .map(|(seqname, full)| {
                let slot = ViewSlot {
                    full: Arc::new(full),
                    filtered: Mutex::new(None),
                };
                (seqname, slot)
            })
            .collect();
        Self {
            slots,
            settings,
            predicate,
            stats: CacheStats::default(),
        }
    }

    /// Get the sequence names, in the order they were first seen.
    pub fn seqnames(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    /// Get the total number of (unfiltered) intervals.
    pub fn len(&self) -> usize {
        self.slots.values().map(|slot| slot.full.len()).sum()
    }

    /// Return whether the view has no intervals.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings(&self) -> &Arc<FilterSettings> {
        &self.settings
    }

    pub fn filter_state(&self) -> FilterState {
        self.settings.state()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Return whether the current thresholds let every interval through.
    pub fn is_pass_through(&self) -> bool {
        self.predicate.is_pass_through(&self.settings.state())
    }

    /// All intervals on `seqname`, ignoring the filter.
    pub fn get_all(&self, seqname: &str) -> Option<Arc<SortedIntervals<U>>> {
        self.slots.get(seqname).map(|slot| Arc::clone(&slot.full))
    }

    /// The intervals on `seqname` passing the filter under the current
    /// thresholds, or `None` if there is no data for `seqname`.
    ///
    /// The list is computed on the first call after construction or after a
    /// threshold change and cached until the next change.
    pub fn get_filtered(&self, seqname: &str) -> Option<Arc<SortedIntervals<U>>> {
        let slot = self.slots.get(seqname)?;
        let mut cached = slot.filtered.lock().unwrap_or_else(PoisonError::into_inner);

        // snapshot under the slot lock, so entries are written in epoch order
        let snapshot = self.settings.snapshot();
        if self.predicate.is_pass_through(&snapshot.state) {
            return Some(Arc::clone(&slot.full));
        }
        if let Some(entry) = cached.as_ref() {
            if entry.epoch == snapshot.epoch {
                return Some(Arc::clone(&entry.list));
            }
        }

        let state = snapshot.state;
        let list = Arc::new(slot.full.filter(|data| self.predicate.passes(data, &state)));
        self.stats.record_filter_scan();
        debug!(
            seqname,
            epoch = snapshot.epoch,
            kept = list.len(),
            total = slot.full.len(),
            "rebuilt filtered intervals"
        );
        *cached = Some(FilteredEntry {
            epoch: snapshot.epoch,
            list: Arc::clone(&list),
        });
        Some(list)
    }

    /// Filtered intervals on `seqname` overlapping `[start, end]`, in start order.
    pub fn overlapping(&self, seqname: &str, start: Position, end: Position) -> Vec<Interval<U>> {
        self.get_filtered(seqname)
            .map(|list| list.overlapping(start, end).cloned().collect())
            .unwrap_or_default()
    }

    /// The filtered interval nearest to `position`, if one is closer
    /// than `max_distance`. See [`SortedIntervals::nearest()`].
    pub fn nearest(
        &self,
        seqname: &str,
        position: Position,
        max_distance: Position,
    ) -> Option<Interval<U>> {
        let list = self.get_filtered(seqname)?;
        let nearest = list.nearest(position, max_distance).cloned();
        nearest
    }

    /// The first filtered interval containing `position` (ends inclusive).
    pub fn feature_at(&self, seqname: &str, position: Position) -> Option<Interval<U>> {
        let list = self.get_filtered(seqname)?;
        let feature = list.feature_at(position).cloned();
        feature
    }
}

impl<U, F> FilteredView<U, F>
where
    U: Clone + Scored,
    F: FilterPredicate<U>,
{
    /// The maximum score of the filtered intervals overlapping `[start, end]`;
    /// `None` for a degenerate region or when there is no data.
    pub fn max_score_in_region(&self, seqname: &str, start: Position, end: Position) -> Option<f32> {
        if end <= start {
            return None;
        }
        self.get_filtered(seqname)?.max_score_in_region(start, end)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::prelude::*;
    use crate::test_utilities::{random_peaks, scenario_peaks};

    fn scenario_view(state: FilterState) -> FilteredView<Peak> {
        FilteredView::new(scenario_peaks(), FilterSettings::shared(state))
    }

    fn as_tuples(ivs: &[Interval<Peak>]) -> Vec<(Position, Position, f32)> {
        ivs.iter()
            .map(|iv| (iv.start(), iv.end(), iv.data().score))
            .collect()
    }

    #[test]
    fn test_scenario() {
        let view = scenario_view(FilterState::new(30.0, 0.0));

        let filtered = view.get_filtered("1").unwrap();
        assert_eq!(
            as_tuples(filtered.as_slice()),
            vec![(100, 200, 50.0), (300, 400, 80.0)]
        );
        assert_eq!(
            as_tuples(&view.overlapping("1", 180, 320)),
            vec![(100, 200, 50.0), (300, 400, 80.0)]
        );

        let nearest = view.nearest("1", 260, 100).unwrap();
        assert_eq!((nearest.start(), nearest.end()), (300, 400));
        assert_eq!(nearest.distance_to(260), 40);

        assert_eq!(view.max_score_in_region("1", 0, 500), Some(80.0));
    }

    #[test]
    fn test_get_filtered_is_cached() {
        let view = scenario_view(FilterState::new(30.0, 0.0));
        let first = view.get_filtered("1").unwrap();
        let second = view.get_filtered("1").unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(view.stats().snapshot().filter_scans, 1);
    }

    #[test]
    fn test_invalidation_rebuilds() {
        let view = scenario_view(FilterState::new(30.0, 0.0));
        assert_eq!(view.get_filtered("1").unwrap().len(), 2);

        view.settings().set(FilterState::new(60.0, 0.0));
        let filtered = view.get_filtered("1").unwrap();
        assert_eq!(as_tuples(filtered.as_slice()), vec![(300, 400, 80.0)]);
        assert_eq!(view.stats().snapshot().filter_scans, 2);

        view.settings().set(FilterState::new(5.0, 0.0));
        assert_eq!(view.get_filtered("1").unwrap().len(), 3);
    }

    #[test]
    fn test_permissive_returns_full_list_without_scan() {
        let view = scenario_view(FilterState::default());
        let filtered = view.get_filtered("1").unwrap();
        assert!(Arc::ptr_eq(&filtered, &view.get_all("1").unwrap()));
        assert_eq!(view.stats().snapshot().filter_scans, 0);
    }

    #[test]
    fn test_unknown_sequence() {
        let view = scenario_view(FilterState::new(30.0, 0.0));
        assert!(view.get_filtered("chrUn").is_none());
        assert!(view.overlapping("chrUn", 0, 1_000).is_empty());
        assert!(view.nearest("chrUn", 10, 1_000).is_none());
        assert_eq!(view.max_score_in_region("chrUn", 0, 1_000), None);
    }

    #[test]
    fn test_degenerate_region() {
        let view = scenario_view(FilterState::new(30.0, 0.0));
        assert!(view.overlapping("1", 320, 180).is_empty());
        assert_eq!(view.max_score_in_region("1", 200, 200), None);
    }

    #[test]
    fn test_feature_at_respects_filter() {
        let view = scenario_view(FilterState::new(30.0, 0.0));
        // 150-250 is filtered out
        assert!(view.feature_at("1", 225).is_none());
        assert_eq!(view.feature_at("1", 350).map(|iv| iv.start()), Some(300));
    }

    #[test]
    fn test_views_share_settings() {
        let settings = FilterSettings::shared(FilterState::new(30.0, 0.0));
        let view_a = FilteredView::new(scenario_peaks(), Arc::clone(&settings));
        let view_b = FilteredView::new(scenario_peaks(), Arc::clone(&settings));
        assert_eq!(view_a.get_filtered("1").unwrap().len(), 2);
        assert_eq!(view_b.get_filtered("1").unwrap().len(), 2);

        settings.set(FilterState::new(70.0, 0.0));
        assert_eq!(view_a.get_filtered("1").unwrap().len(), 1);
        assert_eq!(view_b.get_filtered("1").unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_get_filtered_same_sequence() {
        let peaks = random_peaks(&["chr1", "chr2"], 5_000, 10_000_000);
        let view = Arc::new(FilteredView::new(
            peaks,
            FilterSettings::shared(FilterState::new(50.0, 0.0)),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let view = Arc::clone(&view);
                thread::spawn(move || {
                    let seqname = if i % 2 == 0 { "chr1" } else { "chr2" };
                    view.get_filtered(seqname).unwrap()
                })
            })
            .collect();
        let lists: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // one build per sequence; every reader of a sequence got the same list
        assert_eq!(view.stats().snapshot().filter_scans, 2);
        for pair in lists.chunks(2).collect::<Vec<_>>().windows(2) {
            assert!(Arc::ptr_eq(&pair[0][0], &pair[1][0]));
            assert!(Arc::ptr_eq(&pair[0][1], &pair[1][1]));
        }
        assert!(lists[0].iter().all(|iv| iv.data().score >= 50.0));
    }

    #[test]
    fn test_threshold_changes_during_concurrent_reads() {
        let settings = FilterSettings::shared(FilterState::new(30.0, 0.0));
        let view = Arc::new(FilteredView::new(
            random_peaks(&["chr1"], 2_000, 1_000_000),
            Arc::clone(&settings),
        ));
        let states = [
            FilterState::new(30.0, 0.0),
            FilterState::new(60.0, 0.0),
            FilterState::new(10.0, 5.0),
            FilterState::default(),
        ];
        let full = view.get_all("chr1").unwrap();
        let expected: Vec<Vec<Interval<Peak>>> = states
            .iter()
            .map(|state| {
                full.iter()
                    .filter(|iv| ThresholdFilter.passes(iv.data(), state))
                    .cloned()
                    .collect()
            })
            .collect();
        let expected = Arc::new(expected);

        let writer = {
            let settings = Arc::clone(&settings);
            thread::spawn(move || {
                for i in 0..200 {
                    settings.set(states[i % states.len()]);
                    thread::yield_now();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let view = Arc::clone(&view);
                let expected = Arc::clone(&expected);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let list = view.get_filtered("chr1").unwrap();
                        // every list is the full list filtered under exactly one state
                        assert!(expected.iter().any(|want| list.as_slice() == want.as_slice()));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        // once the writer is done, readers see the last state
        let last = (200 - 1) % states.len();
        assert_eq!(view.filter_state(), states[last]);
        assert_eq!(view.get_filtered("chr1").unwrap().as_slice(), expected[last].as_slice());
    }
}
