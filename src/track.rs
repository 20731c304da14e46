//! The [`PeakTrack`]: a named peak set, optionally paired with a signal
//! track, queried the way a genome browser track is.
//!
//! Peaks are served from a [`FilteredView`]. The signal (if any) is read
//! through a [`RangeQueryCache`] and masked by the filtered peaks with
//! [`PeakMaskedSignal`]. A track may also carry one signal per time point
//! of a time course, each cached and masked the same way.

use std::sync::Arc;

use crate::{
    cache::RangeQueryCache,
    error::PeakViewError,
    filter::FilterState,
    ranges::{sorted::SortedIntervals, Interval, Peak, SignalValue},
    sources::{MemorySource, PeakMaskedSignal},
    traits::FeatureSource,
    view::FilteredView,
    Position,
};

pub struct PeakTrack<S: FeatureSource = MemorySource<SignalValue>> {
    name: String,
    peaks: Arc<FilteredView<Peak>>,
    signal: Option<PeakMaskedSignal<RangeQueryCache<S>>>,
    time_signals: Vec<PeakMaskedSignal<RangeQueryCache<S>>>,
}

impl<S: FeatureSource> std::fmt::Debug for PeakTrack<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeakTrack")
            .field("name", &self.name)
            .field("peaks", &self.peaks)
            .field("signal", &self.signal.as_ref().map(|masked| masked.signal()))
            .field("n_time_points", &self.time_signals.len())
            .finish()
    }
}

impl PeakTrack {
    /// Create a new peak-only track.
    pub fn new(name: impl Into<String>, peaks: Arc<FilteredView<Peak>>) -> Self {
        Self {
            name: name.into(),
            peaks,
            signal: None,
            time_signals: Vec::new(),
        }
    }
}

impl<S: FeatureSource> PeakTrack<S> {
    /// Create a new track pairing `peaks` with the signal `source`.
    pub fn with_signal(name: impl Into<String>, peaks: Arc<FilteredView<Peak>>, source: S) -> Self {
        let signal = PeakMaskedSignal::new(RangeQueryCache::new(source), Arc::clone(&peaks));
        Self {
            name: name.into(),
            peaks,
            signal: Some(signal),
            time_signals: Vec::new(),
        }
    }

    /// Add one signal source per time point, in time order. Each is cached
    /// and masked by this track's filtered peaks.
    pub fn with_time_signals<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let peaks = &self.peaks;
        self.time_signals.extend(
            sources
                .into_iter()
                .map(|source| PeakMaskedSignal::new(RangeQueryCache::new(source), Arc::clone(peaks))),
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peaks(&self) -> &Arc<FilteredView<Peak>> {
        &self.peaks
    }

    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// The signal cache, if this track has a signal.
    pub fn signal_cache(&self) -> Option<&RangeQueryCache<S>> {
        self.signal.as_ref().map(|masked| masked.signal())
    }

    /// The number of time points with a signal.
    pub fn n_time_points(&self) -> usize {
        self.time_signals.len()
    }

    /// The signal cache of time point `index`, if there is one.
    pub fn time_point_cache(&self, index: usize) -> Option<&RangeQueryCache<S>> {
        self.time_signals.get(index).map(|masked| masked.signal())
    }

    /// Set the thresholds. Every track sharing this track's settings is
    /// invalidated.
    pub fn set_filter_state(&self, score_threshold: f32, fold_change_threshold: f32) {
        self.peaks
            .settings()
            .set(FilterState::new(score_threshold, fold_change_threshold));
    }

    pub fn filter_state(&self) -> FilterState {
        self.peaks.filter_state()
    }

    /// The peaks on `seqname` passing the current thresholds.
    pub fn get_filtered(&self, seqname: &str) -> Option<Arc<SortedIntervals<Peak>>> {
        self.peaks.get_filtered(seqname)
    }

    pub fn overlapping(&self, seqname: &str, start: Position, end: Position) -> Vec<Interval<Peak>> {
        self.peaks.overlapping(seqname, start, end)
    }

    pub fn nearest(
        &self,
        seqname: &str,
        position: Position,
        max_distance: Position,
    ) -> Option<Interval<Peak>> {
        self.peaks.nearest(seqname, position, max_distance)
    }

    pub fn feature_at(&self, seqname: &str, position: Position) -> Option<Interval<Peak>> {
        self.peaks.feature_at(seqname, position)
    }

    pub fn max_score_in_region(&self, seqname: &str, start: Position, end: Position) -> Option<f32> {
        self.peaks.max_score_in_region(seqname, start, end)
    }

    /// Signal bins on `seqname` overlapping `[start, end]`, restricted to the
    /// filtered peaks. A track without a signal returns no bins.
    pub fn signal(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<S::Data>>, PeakViewError> {
        match &self.signal {
            Some(masked) => masked.query(seqname, start, end, zoom),
            None => Ok(Vec::new()),
        }
    }

    /// Signal bins of time point `index`, like [`PeakTrack::signal()`].
    pub fn time_point_signal(
        &self,
        index: usize,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<S::Data>>, PeakViewError> {
        let masked = self
            .time_signals
            .get(index)
            .ok_or(PeakViewError::TimePointOutOfRange(index, self.time_signals.len()))?;
        masked.query(seqname, start, end, zoom)
    }

    /// The `(min, max)` data range of the signal, for scaling.
    pub fn signal_data_range(&self) -> Option<(f64, f64)> {
        self.signal
            .as_ref()
            .map(|masked| (masked.data_min(), masked.data_max()))
    }
}
