//! The start-sorted, per-sequence interval container [`SortedIntervals`].
//!
//! # Developer Notes
//!
//! Scanning forward from the last interval starting at or before a query
//! position is only correct if no earlier interval reaches past it. Interval
//! lengths in peak and signal data vary a lot, so alongside the intervals we
//! keep the running maximum of their end positions. This is non-decreasing,
//! so the first interval that could reach a query window is found with a
//! second binary search, and overlap queries are exact.

use std::slice;

use crate::{
    ranges::Interval,
    traits::{GenericRange, Scored},
    Position,
};

/// An immutable list of [`Interval`]s sorted by start position.
///
/// Intervals with equal starts keep the order in which they were supplied.
/// A [`SortedIntervals`] is never modified once built; filtering produces a
/// new list.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedIntervals<U> {
    intervals: Vec<Interval<U>>,
    /// `max_ends[i]` is the largest end of `intervals[..=i]`.
    max_ends: Vec<Position>,
}

impl<U> Default for SortedIntervals<U> {
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
            max_ends: Vec::new(),
        }
    }
}

impl<U> SortedIntervals<U> {
    /// Build a new [`SortedIntervals`], sorting the intervals by start (stable).
    pub fn new(mut intervals: Vec<Interval<U>>) -> Self {
        intervals.sort_by_key(|iv| iv.start());
        Self::from_sorted(intervals)
    }

    fn from_sorted(intervals: Vec<Interval<U>>) -> Self {
        let mut max_ends = Vec::with_capacity(intervals.len());
        let mut running = Position::MIN;
        for iv in &intervals {
            running = running.max(iv.end());
            max_ends.push(running);
        }
        Self {
            intervals,
            max_ends,
        }
    }

    /// Return the number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Return whether there are no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Interval<U>> {
        self.intervals.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Interval<U>> {
        self.intervals.iter()
    }

    pub fn as_slice(&self) -> &[Interval<U>] {
        &self.intervals
    }

    pub fn into_vec(self) -> Vec<Interval<U>> {
        self.intervals
    }

    /// The greatest index `i` with `self[i].start() <= position`, or `None`
    /// if every interval starts after `position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use peakview::prelude::*;
    ///
    /// let list = SortedIntervals::new(intervals!("1", [(10, 20, ()), (30, 40, ())]));
    /// assert_eq!(list.index_at_or_before(5), None);
    /// assert_eq!(list.index_at_or_before(10), Some(0));
    /// assert_eq!(list.index_at_or_before(35), Some(1));
    /// ```
    pub fn index_at_or_before(&self, position: Position) -> Option<usize> {
        let n_at_or_before = self.intervals.partition_point(|iv| iv.start() <= position);
        n_at_or_before.checked_sub(1)
    }

    /// Index of the first interval whose end (or any earlier interval's end)
    /// reaches `position`. No interval before it can overlap a window
    /// starting at `position`.
    fn first_reaching(&self, position: Position) -> usize {
        self.max_ends.partition_point(|&max_end| max_end < position)
    }

    /// Iterate over the intervals overlapping the window `[start, end]`, in
    /// start order (see [`GenericRange::overlaps_window`]). An empty window
    /// (`end < start`) yields nothing.
    pub fn overlapping(&self, start: Position, end: Position) -> Overlapping<'_, U> {
        let remaining = if end < start {
            &self.intervals[..0]
        } else {
            &self.intervals[self.first_reaching(start)..]
        };
        Overlapping {
            iter: remaining.iter(),
            start,
            end,
        }
    }

    /// The first interval with `start <= position <= end`, if any.
    pub fn feature_at(&self, position: Position) -> Option<&Interval<U>> {
        self.overlapping(position, position).next()
    }

    /// The interval closest to `position`, if one is closer than
    /// `max_distance`.
    ///
    /// Distance is measured to the nearest endpoint, and is zero for an
    /// interval containing `position`. The first interval that strictly
    /// contains `position` is returned immediately; otherwise the earliest
    /// interval at the minimum distance wins. All intervals closer than
    /// `max_distance` are considered, so the result is exact.
    pub fn nearest(&self, position: Position, max_distance: Position) -> Option<&Interval<U>> {
        if max_distance <= 0 {
            return None;
        }
        let window_start = position.saturating_sub(max_distance);
        let window_end = position.saturating_add(max_distance);

        let mut best: Option<(Position, &Interval<U>)> = None;
        for iv in self.overlapping(window_start, window_end) {
            if iv.strictly_contains(position) {
                return Some(iv);
            }
            let distance = iv.distance_to(position);
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, iv));
            }
        }
        best.filter(|(distance, _)| *distance < max_distance)
            .map(|(_, iv)| iv)
    }

    /// Build a new list of the intervals whose data passes `keep`, preserving
    /// order.
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        U: Clone,
        F: FnMut(&U) -> bool,
    {
        // peak filtering typically keeps about half of the input
        let mut kept = Vec::with_capacity(self.len() / 2);
        kept.extend(self.intervals.iter().filter(|iv| keep(iv.data())).cloned());
        Self::from_sorted(kept)
    }
}

impl<U: Scored> SortedIntervals<U> {
    /// The maximum score of the intervals overlapping `[start, end]`, or
    /// `None` if the region is degenerate (`end <= start`) or has no data.
    pub fn max_score_in_region(&self, start: Position, end: Position) -> Option<f32> {
        if end <= start {
            return None;
        }
        self.overlapping(start, end)
            .map(|iv| iv.data().score())
            .filter(|score| !score.is_nan())
            .fold(None, |best: Option<f32>, score| match best {
                Some(current) if current >= score => Some(current),
                _ => Some(score),
            })
    }
}

impl<U> FromIterator<Interval<U>> for SortedIntervals<U> {
    fn from_iter<I: IntoIterator<Item = Interval<U>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, U> IntoIterator for &'a SortedIntervals<U> {
    type Item = &'a Interval<U>;
    type IntoIter = slice::Iter<'a, Interval<U>>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

/// An iterator over the intervals of a [`SortedIntervals`] that overlap a
/// query window, created by [`SortedIntervals::overlapping()`].
#[derive(Debug, Clone)]
pub struct Overlapping<'a, U> {
    iter: slice::Iter<'a, Interval<U>>,
    start: Position,
    end: Position,
}

impl<'a, U> Iterator for Overlapping<'a, U> {
    type Item = &'a Interval<U>;

    fn next(&mut self) -> Option<Self::Item> {
        for iv in self.iter.by_ref() {
            if iv.start() > self.end {
                // sorted by start: nothing further can overlap
                self.iter = Default::default();
                return None;
            }
            if iv.end() >= self.start {
                return Some(iv);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use crate::test_utilities::{naive_overlapping, random_intervals, scenario_peaks};

    fn starts<'a, U: 'a>(ivs: impl IntoIterator<Item = &'a Interval<U>>) -> Vec<Position> {
        ivs.into_iter().map(|iv| iv.start()).collect()
    }

    #[test]
    fn test_sorts_stably() {
        let list = SortedIntervals::new(intervals!(
            "1",
            [(50, 60, 1.0_f32), (10, 20, 2.0), (50, 55, 3.0), (10, 12, 4.0)]
        ));
        let scores: Vec<f32> = list.iter().map(|iv| *iv.data()).collect();
        assert_eq!(scores, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_index_at_or_before_empty() {
        let list: SortedIntervals<()> = SortedIntervals::default();
        assert_eq!(list.index_at_or_before(100), None);
        assert_eq!(list.overlapping(0, 100).count(), 0);
    }

    #[test]
    fn test_index_at_or_before_ties() {
        let list = SortedIntervals::new(intervals!("1", [(10, 20, ()), (10, 30, ()), (40, 50, ())]));
        assert_eq!(list.index_at_or_before(10), Some(1));
        assert_eq!(list.index_at_or_before(39), Some(1));
        assert_eq!(list.index_at_or_before(1_000), Some(2));
    }

    #[test]
    fn test_overlapping_scenario() {
        let list = SortedIntervals::new(scenario_peaks());
        assert_eq!(starts(list.overlapping(180, 320)), vec![100, 150, 300]);
        assert_eq!(starts(list.overlapping(201, 249)), vec![150]);
        assert_eq!(starts(list.overlapping(401, 500)), Vec::<Position>::new());
    }

    #[test]
    fn test_overlapping_long_interval_before_start_index() {
        // the first interval spans everything; a local scan from the
        // index-at-or-before position would miss it
        let list = SortedIntervals::new(intervals!(
            "1",
            [(0, 10_000, ()), (100, 110, ()), (200, 210, ()), (5_000, 5_010, ())]
        ));
        assert_eq!(starts(list.overlapping(4_000, 4_100)), vec![0]);
        assert_eq!(starts(list.overlapping(5_005, 5_005)), vec![0, 5_000]);
    }

    #[test]
    fn test_overlapping_inverted_window_is_empty() {
        let list = SortedIntervals::new(scenario_peaks());
        assert_eq!(list.overlapping(320, 180).count(), 0);
    }

    #[test]
    fn test_overlapping_matches_naive_random() {
        let ivs = random_intervals("chr1", 2_000, 1_000_000);
        let list = SortedIntervals::new(ivs.clone());
        for (start, end) in [(0, 100), (5_000, 5_500), (999_000, 1_000_000), (250_000, 260_000)] {
            let expected = naive_overlapping(list.as_slice(), start, end);
            let got: Vec<_> = list.overlapping(start, end).cloned().collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_feature_at() {
        let list = SortedIntervals::new(scenario_peaks());
        assert_eq!(list.feature_at(175).map(|iv| iv.start()), Some(100));
        assert_eq!(list.feature_at(220).map(|iv| iv.start()), Some(150));
        assert!(list.feature_at(275).is_none());
    }

    #[test]
    fn test_nearest() {
        let list = SortedIntervals::new(intervals!("1", [(100, 200, ()), (300, 400, ())]));
        let hit = list.nearest(260, 100).unwrap();
        assert_eq!(hit.as_tuple(), (300, 400));
        assert_eq!(hit.distance_to(260), 40);

        // strictly contained
        assert_eq!(list.nearest(150, 1).unwrap().as_tuple(), (100, 200));
        assert!(list.nearest(150, 0).is_none());
        // closer to the earlier interval
        assert_eq!(list.nearest(230, 100).unwrap().as_tuple(), (100, 200));
        // out of range
        assert!(list.nearest(260, 39).is_none());
        // a candidate exactly at max_distance is excluded
        assert!(list.nearest(260, 40).is_none());
        assert_eq!(list.nearest(260, 41).unwrap().as_tuple(), (300, 400));
        assert!(list.nearest(1_000, 100).is_none());
        // before every interval
        assert_eq!(list.nearest(50, 100).unwrap().as_tuple(), (100, 200));
    }

    #[test]
    fn test_nearest_finds_short_interval_behind_long_one() {
        let list = SortedIntervals::new(intervals!("1", [(0, 1_000, ()), (600, 610, ())]));
        assert_eq!(list.nearest(1_500, 1_000).unwrap().as_tuple(), (0, 1_000));
        assert_eq!(list.nearest(605, 10).unwrap().as_tuple(), (0, 1_000));
    }

    #[test]
    fn test_max_score_in_region() {
        let list = SortedIntervals::new(scenario_peaks());
        assert_eq!(list.max_score_in_region(0, 500), Some(80.0));
        assert_eq!(list.max_score_in_region(0, 140), Some(50.0));
        assert_eq!(list.max_score_in_region(500, 600), None);
        assert_eq!(list.max_score_in_region(300, 300), None);
        assert_eq!(list.max_score_in_region(300, 200), None);
    }

    #[test]
    fn test_filter_preserves_order() {
        let list = SortedIntervals::new(scenario_peaks());
        let filtered = list.filter(|peak| peak.score >= 30.0);
        assert_eq!(starts(filtered.iter()), vec![100, 300]);
        // overlap index is rebuilt for the filtered list
        assert_eq!(starts(filtered.overlapping(180, 320)), vec![100, 300]);
    }
}
