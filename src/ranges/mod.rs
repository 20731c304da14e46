//! Interval and payload types.
//!

use indexmap::IndexMap;

use crate::{
    error::PeakViewError,
    traits::{GenericRange, Scored, TsvSerialize},
    Position,
};

pub mod sorted;

use sorted::SortedIntervals;

/// An immutable, 0-indexed right-exclusive range `[start, end)` on a named
/// sequence, carrying some data `U` (a peak, a signal value, etc).
#[derive(Debug, Clone, PartialEq)]
pub struct Interval<U> {
    seqname: String,
    start: Position,
    end: Position,
    data: U,
}

impl<U> Interval<U> {
    /// Create a new interval, raising [`PeakViewError::InvalidGenomicRange`]
    /// if `start > end`. Zero-width intervals are allowed.
    pub fn new(
        seqname: impl Into<String>,
        start: Position,
        end: Position,
        data: U,
    ) -> Result<Self, PeakViewError> {
        validate_range(start, end)?;
        Ok(Self {
            seqname: seqname.into(),
            start,
            end,
            data,
        })
    }

    pub fn seqname(&self) -> &str {
        &self.seqname
    }

    pub fn data(&self) -> &U {
        &self.data
    }

    /// Consume the interval, returning its data.
    pub fn into_data(self) -> U {
        self.data
    }
}

impl<U> GenericRange for Interval<U> {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

impl<U: TsvSerialize> TsvSerialize for Interval<U> {
    fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.seqname,
            self.start,
            self.end,
            self.data.to_tsv()
        )
    }
}

/// A called peak.
///
/// # Fields
/// * `name`: the peak name, if the file has one.
/// * `score`: the peak score used for thresholding and region maxima.
/// * `fold_change`: enrichment over background (e.g. a narrowPeak
///   `signalValue`), if known.
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub name: Option<String>,
    pub score: f32,
    pub fold_change: Option<f32>,
}

impl Peak {
    pub fn new(score: f32, fold_change: Option<f32>) -> Self {
        Self {
            name: None,
            score,
            fold_change,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Scored for Peak {
    fn score(&self) -> f32 {
        self.score
    }
    fn fold_change(&self) -> Option<f32> {
        self.fold_change
    }
}

impl TsvSerialize for Peak {
    fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}",
            self.name.clone().to_tsv(),
            self.score,
            self.fold_change.to_tsv()
        )
    }
}

/// One summarized bin of a signal track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalValue {
    pub value: f32,
}

impl SignalValue {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Scored for SignalValue {
    fn score(&self) -> f32 {
        self.value
    }
}

impl TsvSerialize for SignalValue {
    fn to_tsv(&self) -> String {
        self.value.to_string()
    }
}

/// Group intervals by sequence name, in the order sequences are first seen,
/// building a [`SortedIntervals`] for each.
pub fn group_by_seqname<U, I>(intervals: I) -> IndexMap<String, SortedIntervals<U>>
where
    I: IntoIterator<Item = Interval<U>>,
{
    let mut grouped: IndexMap<String, Vec<Interval<U>>> = IndexMap::new();
    for iv in intervals {
        match grouped.get_mut(iv.seqname()) {
            Some(group) => group.push(iv),
            None => {
                grouped.insert(iv.seqname().to_string(), vec![iv]);
            }
        }
    }
    grouped
        .into_iter()
        .map(|(seqname, group)| (seqname, SortedIntervals::new(group)))
        .collect()
}

/// Validates that `start <= end`.
pub fn validate_range(start: Position, end: Position) -> Result<(), PeakViewError> {
    if start > end {
        return Err(PeakViewError::InvalidGenomicRange(start, end));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_invalid_range_start_end() {
        let result = validate_range(5, 1);
        assert!(matches!(
            result,
            Err(PeakViewError::InvalidGenomicRange(5, 1))
        ));
    }

    #[test]
    fn test_zero_width_is_valid() {
        let iv = Interval::new("chr1", 10, 10, ()).unwrap();
        assert_eq!(iv.width(), 0);
    }

    #[test]
    fn test_interval_rejects_inverted() {
        assert!(Interval::new("chr1", 10, 9, 1.0_f32).is_err());
    }

    #[test]
    fn test_group_by_seqname() {
        let mut ivs = intervals!("chr2", [(50, 60, 1.0_f32)]);
        ivs.extend(intervals!("chr1", [(30, 40, 2.0), (10, 20, 3.0)]));
        ivs.extend(intervals!("chr2", [(5, 6, 4.0)]));
        let grouped = group_by_seqname(ivs);
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["chr2", "chr1"]);
        let chr1: Vec<Position> = grouped["chr1"].iter().map(|iv| iv.start()).collect();
        assert_eq!(chr1, vec![10, 30]);
        assert_eq!(grouped["chr2"].len(), 2);
    }

    #[test]
    fn test_peak_to_tsv() {
        let iv = Interval::new("chr2", 5, 15, Peak::new(40.0, None).with_name("p1")).unwrap();
        assert_eq!(iv.to_tsv(), "chr2\t5\t15\tp1\t40\t.");
    }

    #[test]
    fn test_signal_to_tsv() {
        let iv = Interval::new("chr2", 0, 25, SignalValue::new(1.5)).unwrap();
        assert_eq!(iv.to_tsv(), "chr2\t0\t25\t1.5");
    }
}
