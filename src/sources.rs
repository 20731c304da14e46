//! [`FeatureSource`] implementations.
//!
//!  - [`MemorySource`]: intervals held in memory, e.g. a signal track loaded
//!    from a bedGraph file.
//!  - [`PeakMaskedSignal`]: a signal source restricted to the bins covered by
//!    filtered peaks.
//!

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    error::PeakViewError,
    filter::ThresholdFilter,
    ranges::{group_by_seqname, sorted::SortedIntervals, Interval, Peak},
    traits::{FeatureSource, FilterPredicate, GenericRange, Scored},
    view::FilteredView,
    Position,
};

/// An in-memory [`FeatureSource`] with exact overlap semantics.
#[derive(Debug, Clone)]
pub struct MemorySource<U> {
    sequences: IndexMap<String, SortedIntervals<U>>,
    data_min: f64,
    data_max: f64,
}

impl<U: Scored> MemorySource<U> {
    /// Build a new [`MemorySource`]. The data range is taken from the
    /// payload scores (`0.0..0.0` when there are none).
    pub fn new<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = Interval<U>>,
    {
        let sequences = group_by_seqname(intervals);
        let mut range: Option<(f64, f64)> = None;
        for score in sequences
            .values()
            .flat_map(|list| list.iter())
            .map(|iv| f64::from(iv.data().score()))
            .filter(|score| !score.is_nan())
        {
            range = Some(match range {
                None => (score, score),
                Some((min, max)) => (min.min(score), max.max(score)),
            });
        }
        let (data_min, data_max) = range.unwrap_or((0.0, 0.0));
        Self {
            sequences,
            data_min,
            data_max,
        }
    }
}

impl<U> MemorySource<U> {
    /// Get the sequence names.
    pub fn seqnames(&self) -> Vec<String> {
        self.sequences.keys().cloned().collect()
    }

    /// Get the total number of intervals.
    pub fn len(&self) -> usize {
        self.sequences.values().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<U: Clone> FeatureSource for MemorySource<U> {
    type Data = U;

    /// The zoom level is ignored: the data is held at full resolution.
    fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        _zoom: i32,
    ) -> Result<Vec<Interval<U>>, PeakViewError> {
        Ok(self
            .sequences
            .get(seqname)
            .map(|list| list.overlapping(start, end).cloned().collect())
            .unwrap_or_default())
    }

    fn data_min(&self) -> f64 {
        self.data_min
    }

    fn data_max(&self) -> f64 {
        self.data_max
    }
}

/// A signal [`FeatureSource`] masked by the filtered peaks of a
/// [`FilteredView`].
///
/// While a filter is in effect, a query returns the signal bins that overlap
/// the query window and at least one filtered peak. The signal is fetched
/// once for the window. Under permissive thresholds the wrapped source's
/// results are returned unchanged.
///
/// A sub-window of a query always sees the same bins as a direct query, so
/// this type may itself sit under a [`RangeQueryCache`]. Prefer
/// wrapping the *signal* source in a [`RangeQueryCache`]: masked results
/// depend on the thresholds, the raw signal does not.
///
/// [`RangeQueryCache`]: crate::cache::RangeQueryCache
#[derive(Debug)]
pub struct PeakMaskedSignal<S, P = Peak, F = ThresholdFilter> {
    signal: S,
    peaks: Arc<FilteredView<P, F>>,
}

impl<S, P, F> PeakMaskedSignal<S, P, F>
where
    S: FeatureSource,
    P: Clone,
    F: FilterPredicate<P>,
{
    pub fn new(signal: S, peaks: Arc<FilteredView<P, F>>) -> Self {
        Self { signal, peaks }
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    pub fn peaks(&self) -> &Arc<FilteredView<P, F>> {
        &self.peaks
    }
}

impl<S, P, F> FeatureSource for PeakMaskedSignal<S, P, F>
where
    S: FeatureSource,
    P: Clone,
    F: FilterPredicate<P>,
{
    type Data = S::Data;

    fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<S::Data>>, PeakViewError> {
        if self.peaks.is_pass_through() {
            return self.signal.query(seqname, start, end, zoom);
        }
        if end < start {
            return Ok(Vec::new());
        }
        let Some(peaks) = self.peaks.get_filtered(seqname) else {
            return Ok(Vec::new());
        };
        if peaks.is_empty() {
            return Ok(Vec::new());
        }

        let signal = self.signal.query(seqname, start, end, zoom)?;
        let n_bins = signal.len();
        let masked: Vec<_> = signal
            .into_iter()
            .filter(|bin| {
                bin.overlaps_window(start, end)
                    && peaks.overlapping(bin.start(), bin.end()).next().is_some()
            })
            .collect();
        debug!(
            seqname,
            start,
            end,
            kept = masked.len(),
            total = n_bins,
            "masked signal by filtered peaks"
        );
        Ok(masked)
    }

    fn data_min(&self) -> f64 {
        self.signal.data_min()
    }

    fn data_max(&self) -> f64 {
        self.signal.data_max()
    }
}
