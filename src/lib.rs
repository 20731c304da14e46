//! # peakview
//!
//! A caching feature-query engine for genome browser tracks. Peak calls and
//! signal tracks are served as [`Interval`]s over a per-sequence coordinate
//! space, with:
//!
//!  - [`SortedIntervals`]: per-sequence start-sorted interval lists, with binary
//!    search lookup and exact overlap queries.
//!  - [`FilteredView`]: lazily built, per-sequence filtered lists that are
//!    rebuilt whenever the shared [`FilterState`] changes.
//!  - [`RangeQueryCache`]: a wrapper around a slow [`FeatureSource`] (e.g. a
//!    disk-backed indexed file) that serves contained sub-range queries from
//!    the last materialized result.
//!
//! [`Interval`]: crate::ranges::Interval
//! [`SortedIntervals`]: crate::ranges::sorted::SortedIntervals
//! [`FilteredView`]: crate::view::FilteredView
//! [`FilterState`]: crate::filter::FilterState
//! [`RangeQueryCache`]: crate::cache::RangeQueryCache
//! [`FeatureSource`]: crate::traits::FeatureSource

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod ranges;
pub mod reporting;
pub mod session;
pub mod sources;
pub mod test_utilities;
pub mod track;
pub mod traits;
pub mod view;

/// Genomic coordinate type. 0-indexed; ranges are right-exclusive.
pub type Position = i64;

/// Build a vector of [`Interval`]s on a single sequence from
/// `(start, end, data)` tuples, panicking on an invalid range.
///
/// This is mostly a convenience for tests and documentation examples.
///
/// ```
/// use peakview::prelude::*;
///
/// let ivs = intervals!("chr1", [(0, 10, 1.0_f32), (5, 20, 2.0)]);
/// assert_eq!(ivs.len(), 2);
/// assert_eq!(ivs[1].start(), 5);
/// ```
///
/// [`Interval`]: crate::ranges::Interval
#[macro_export]
macro_rules! intervals {
    ($seqname:expr, [$(($start:expr, $end:expr, $data:expr)),* $(,)?]) => {
        vec![$(
            $crate::ranges::Interval::new($seqname, $start, $end, $data)
                .expect("invalid interval in intervals! macro")
        ),*]
    };
}

pub mod prelude {
    pub use crate::cache::RangeQueryCache;
    pub use crate::config::TrackConfig;
    pub use crate::error::PeakViewError;
    pub use crate::filter::{FilterSettings, FilterState, PassAll, ThresholdFilter};
    pub use crate::intervals;
    pub use crate::io::{read_bedgraph, read_peaks, InputFile, OutputFile, PeakFile};
    pub use crate::ranges::sorted::SortedIntervals;
    pub use crate::ranges::{Interval, Peak, SignalValue};
    pub use crate::session::Session;
    pub use crate::sources::{MemorySource, PeakMaskedSignal};
    pub use crate::track::PeakTrack;
    pub use crate::traits::{FeatureSource, FilterPredicate, GenericRange, Scored, TsvSerialize};
    pub use crate::view::FilteredView;
    pub use crate::Position;
}
