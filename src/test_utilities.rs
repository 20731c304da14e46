//! Test cases and test utility functions.
//!

use rand::{seq::SliceRandom, thread_rng, Rng};

use crate::{
    ranges::{Interval, Peak, SignalValue},
    traits::GenericRange,
    Position,
};

// Stochastic test ranges defaults
//
// This is the random number of ranges to use in tests.
// The tradeoff is catching stochastic errors vs test time.
pub const NRANDOM_RANGES: usize = 10000;

// range length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 10000;

// peak scores, roughly MACS2 -log10 q-value * 10 scale
pub const MAX_SCORE: f32 = 100.0;
pub const MAX_FOLD_CHANGE: f32 = 20.0;

/// Build a random range start/end on a sequence of `seqlen`.
/// 0-indexed, right exclusive
pub fn random_range(seqlen: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let len = rng.gen_range(MIN_LEN..MAX_LEN.min(seqlen));
    let start = rng.gen_range(0..seqlen - len + 1);
    (start, start + len)
}

/// Build a random [`Peak`], with a fold change most of the time.
pub fn random_peak() -> Peak {
    let mut rng = thread_rng();
    let score = rng.gen_range(0.0..MAX_SCORE);
    let fold_change = if rng.gen_bool(0.9) {
        Some(rng.gen_range(0.0..MAX_FOLD_CHANGE))
    } else {
        None
    };
    Peak::new(score, fold_change)
}

/// Build `n` random intervals on `seqname` with random `f32` data, in
/// random order.
pub fn random_intervals(seqname: &str, n: usize, seqlen: Position) -> Vec<Interval<f32>> {
    let mut rng = thread_rng();
    (0..n)
        .map(|_| {
            let (start, end) = random_range(seqlen);
            Interval::new(seqname, start, end, rng.gen_range(0.0..MAX_SCORE))
                .expect("random ranges are valid")
        })
        .collect()
}

/// Build `n` random peaks on each of `seqnames`, shuffled across sequences.
pub fn random_peaks(seqnames: &[&str], n: usize, seqlen: Position) -> Vec<Interval<Peak>> {
    let mut peaks: Vec<_> = seqnames
        .iter()
        .flat_map(|seqname| {
            (0..n).map(move |_| {
                let (start, end) = random_range(seqlen);
                Interval::new(*seqname, start, end, random_peak()).expect("random ranges are valid")
            })
        })
        .collect();
    peaks.shuffle(&mut thread_rng());
    peaks
}

/// Build a contiguous signal track of `bin_width` bins over `[0, seqlen)` on
/// each of `seqnames`.
pub fn random_signal(seqnames: &[&str], seqlen: Position, bin_width: Position) -> Vec<Interval<SignalValue>> {
    let mut rng = thread_rng();
    let mut bins = Vec::new();
    for seqname in seqnames {
        let mut start = 0;
        while start < seqlen {
            let end = (start + bin_width).min(seqlen);
            let value = SignalValue::new(rng.gen_range(0.0..MAX_FOLD_CHANGE));
            bins.push(Interval::new(*seqname, start, end, value).expect("bins are valid"));
            start = end;
        }
    }
    bins
}

/// The brute-force overlap query: every interval with `interval.start <= end`
/// and `interval.end >= start`, in input order. Empty windows match nothing.
pub fn naive_overlapping<U: Clone>(
    intervals: &[Interval<U>],
    start: Position,
    end: Position,
) -> Vec<Interval<U>> {
    intervals
        .iter()
        .filter(|iv| start <= end && iv.start() <= end && iv.end() >= start)
        .cloned()
        .collect()
}

/// Three peaks on sequence `"1"`: 100-200 (score 50), 150-250 (score 10),
/// and 300-400 (score 80), none with a fold change.
pub fn scenario_peaks() -> Vec<Interval<Peak>> {
    [(100, 200, 50.0), (150, 250, 10.0), (300, 400, 80.0)]
        .into_iter()
        .map(|(start, end, score)| {
            Interval::new("1", start, end, Peak::new(score, None)).expect("scenario ranges are valid")
        })
        .collect()
}
