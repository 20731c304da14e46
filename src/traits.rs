//! Traits used by the peakview library.
//!

use std::sync::Arc;

use crate::{error::PeakViewError, filter::FilterState, ranges::Interval, Position};

/// The [`GenericRange`] trait defines common functionality for all range types.
pub trait GenericRange {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn width(&self) -> Position {
        self.end() - self.start()
    }

    /// Whether this range overlaps the query window `[start, end]`.
    ///
    /// Every query in this crate uses this rule: a range that touches a window
    /// boundary is reported, so features at the edge of a panned view are not
    /// dropped. An empty window (`end < start`) overlaps nothing.
    fn overlaps_window(&self, start: Position, end: Position) -> bool {
        start <= end && self.start() <= end && self.end() >= start
    }

    /// Whether `position` lies strictly inside this range.
    fn strictly_contains(&self, position: Position) -> bool {
        self.start() < position && position < self.end()
    }

    /// Distance from `position` to the nearest endpoint of this range, or
    /// zero if the position is strictly contained.
    fn distance_to(&self, position: Position) -> Position {
        if self.strictly_contains(position) {
            return 0;
        }
        let to_start = (position - self.start()).abs();
        let to_end = (position - self.end()).abs();
        to_start.min(to_end)
    }

    /// Return a tuple version of this range.
    fn as_tuple(&self) -> (Position, Position) {
        (self.start(), self.end())
    }
}

/// Payloads that carry a score and, optionally, a fold change.
///
/// Filtering and region-max queries read payloads through this trait.
pub trait Scored {
    fn score(&self) -> f32;

    /// The fold change over background, if the payload has one. Payloads
    /// without a fold change pass any fold-change threshold.
    fn fold_change(&self) -> Option<f32> {
        None
    }
}

impl Scored for f32 {
    fn score(&self) -> f32 {
        *self
    }
}

/// Decides whether a payload is included under some [`FilterState`].
///
/// Implementations must be pure functions of `(data, state)`: cached filtered
/// lists are only rebuilt when the state changes.
pub trait FilterPredicate<U> {
    fn passes(&self, data: &U, state: &FilterState) -> bool;

    /// Whether every payload passes under `state`. Callers use this to skip
    /// interval-level filtering entirely, so it must agree with
    /// [`FilterPredicate::passes`].
    fn is_pass_through(&self, state: &FilterState) -> bool {
        let _ = state;
        false
    }
}

/// A range-query source of features, e.g. an indexed on-disk track reader.
///
/// # Contract
///
/// `query(seqname, start, end, zoom)` must return exactly the features on
/// `seqname` that overlap the window `[start, end]` under
/// [`GenericRange::overlaps_window`]. Sources may be slow and may block on
/// IO; failures are reported as [`PeakViewError`] (typically
/// [`PeakViewError::SourceUnavailable`]) and are never retried by callers.
pub trait FeatureSource {
    type Data: Clone;

    fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<Self::Data>>, PeakViewError>;

    /// The smallest data value this source can return.
    fn data_min(&self) -> f64;

    /// The largest data value this source can return.
    fn data_max(&self) -> f64;
}

impl<S: FeatureSource + ?Sized> FeatureSource for Arc<S> {
    type Data = S::Data;

    fn query(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        zoom: i32,
    ) -> Result<Vec<Interval<Self::Data>>, PeakViewError> {
        (**self).query(seqname, start, end, zoom)
    }

    fn data_min(&self) -> f64 {
        (**self).data_min()
    }

    fn data_max(&self) -> f64 {
        (**self).data_max()
    }
}

/// Defines how to serialize something to TSV.
pub trait TsvSerialize {
    // Serialize something to a TSV [`String`].
    fn to_tsv(&self) -> String;
}

impl TsvSerialize for String {
    fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl TsvSerialize for f32 {
    fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl<U: TsvSerialize> TsvSerialize for Option<U> {
    fn to_tsv(&self) -> String {
        self.as_ref().map_or(".".to_string(), |x| x.to_tsv())
    }
}
