//! Randomized checks of the query, filtering and caching invariants.

use std::sync::Arc;

use peakview::prelude::*;
use peakview::test_utilities::naive_overlapping;
use proptest::prelude::*;

fn peaks_strategy() -> impl Strategy<Value = Vec<Interval<Peak>>> {
    let peak = (0..10_000_i64, 0..500_i64, 0.0..100.0_f32, proptest::option::of(0.0..20.0_f32));
    proptest::collection::vec(peak, 0..200).prop_map(|peaks| {
        peaks
            .into_iter()
            .map(|(start, len, score, fold_change)| {
                Interval::new("chr1", start, start + len, Peak::new(score, fold_change)).unwrap()
            })
            .collect()
    })
}

fn window_strategy() -> impl Strategy<Value = (Position, Position)> {
    (-100..10_600_i64, -50..2_000_i64).prop_map(|(start, len)| (start, start + len))
}

fn passes(peak: &Peak, state: &FilterState) -> bool {
    ThresholdFilter.passes(peak, state)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn overlapping_matches_brute_force(peaks in peaks_strategy(), (start, end) in window_strategy()) {
        let list = SortedIntervals::new(peaks);
        let got: Vec<_> = list.overlapping(start, end).cloned().collect();
        prop_assert_eq!(got, naive_overlapping(list.as_slice(), start, end));
    }

    #[test]
    fn index_at_or_before_is_monotonic(peaks in peaks_strategy(), p1 in -100..10_600_i64, delta in 0..5_000_i64) {
        let list = SortedIntervals::new(peaks);
        let first = list.index_at_or_before(p1);
        let second = list.index_at_or_before(p1 + delta);
        prop_assert!(first <= second);
        if let Some(i) = first {
            prop_assert!(list.get(i).unwrap().start() <= p1);
        }
    }

    #[test]
    fn nearest_is_exact(peaks in peaks_strategy(), position in -100..10_600_i64, max_distance in 0..1_000_i64) {
        let list = SortedIntervals::new(peaks);
        let closest = list
            .iter()
            .map(|iv| iv.distance_to(position))
            .filter(|distance| *distance < max_distance)
            .min();
        let found = list.nearest(position, max_distance);
        prop_assert_eq!(found.map(|iv| iv.distance_to(position)), closest);
    }

    #[test]
    fn get_filtered_is_idempotent(peaks in peaks_strategy(), score in 1.0..100.0_f32) {
        let view = FilteredView::new(peaks, FilterSettings::shared(FilterState::new(score, 0.0)));
        let first = view.get_filtered("chr1");
        let scans = view.stats().snapshot().filter_scans;
        let second = view.get_filtered("chr1");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(view.stats().snapshot().filter_scans, scans);
    }

    #[test]
    fn invalidation_reflects_new_thresholds(
        peaks in peaks_strategy(),
        thresholds in proptest::collection::vec((0.0..100.0_f32, 0.0..20.0_f32), 1..5),
    ) {
        let settings = FilterSettings::shared(FilterState::new(50.0, 0.0));
        let view = FilteredView::new(peaks.clone(), Arc::clone(&settings));
        view.get_filtered("chr1");

        for (score, fold_change) in thresholds {
            let state = FilterState::new(score, fold_change);
            settings.set(state);
            let expected: Vec<_> = SortedIntervals::new(peaks.clone())
                .iter()
                .filter(|iv| passes(iv.data(), &state))
                .cloned()
                .collect();
            let got = view
                .get_filtered("chr1")
                .map(|list| list.as_slice().to_vec())
                .unwrap_or_default();
            prop_assert_eq!(got, expected);
        }
    }

    #[test]
    fn cached_queries_match_direct_queries(
        peaks in peaks_strategy(),
        windows in proptest::collection::vec((window_strategy(), 0..3_i32), 1..20),
    ) {
        let cache = RangeQueryCache::new(MemorySource::new(peaks));
        for ((start, end), zoom) in windows {
            let cached = cache.query("chr1", start, end, zoom).unwrap();
            let direct = cache.source().query("chr1", start, end, zoom).unwrap();
            prop_assert_eq!(cached, direct);
        }
    }

    #[test]
    fn cached_masked_signal_matches_direct_queries(
        peaks in peaks_strategy(),
        windows in proptest::collection::vec(window_strategy(), 1..20),
        score in 1.0..100.0_f32,
    ) {
        let settings = FilterSettings::shared(FilterState::new(score, 0.0));
        let view = Arc::new(FilteredView::new(peaks, settings));
        let bins = (0..420).map(|i| Interval::new("chr1", i * 25, (i + 1) * 25, SignalValue::new(1.0)).unwrap());
        let cache = RangeQueryCache::new(PeakMaskedSignal::new(MemorySource::new(bins), view));
        for (start, end) in windows {
            let cached = cache.query("chr1", start, end, 0).unwrap();
            let direct = cache.source().query("chr1", start, end, 0).unwrap();
            prop_assert_eq!(cached, direct);
        }
    }

    #[test]
    fn masked_signal_only_under_filtered_peaks(
        peaks in peaks_strategy(),
        (start, end) in window_strategy(),
        score in 1.0..100.0_f32,
    ) {
        let settings = FilterSettings::shared(FilterState::new(score, 0.0));
        let view = Arc::new(FilteredView::new(peaks, settings));
        let bins = (0..420).map(|i| Interval::new("chr1", i * 25, (i + 1) * 25, SignalValue::new(1.0)).unwrap());
        let masked = PeakMaskedSignal::new(MemorySource::new(bins), Arc::clone(&view));

        let filtered = view.get_filtered("chr1").map(|list| list.as_slice().to_vec()).unwrap_or_default();
        let got = masked.query("chr1", start, end, 0).unwrap();
        let expected: Vec<_> = masked
            .signal()
            .query("chr1", start, end, 0)
            .unwrap()
            .into_iter()
            .filter(|bin| filtered.iter().any(|peak| peak.overlaps_window(bin.start(), bin.end())))
            .collect();
        prop_assert!(got.iter().all(|bin| bin.overlaps_window(start, end)));
        prop_assert_eq!(got, expected);
    }
}
