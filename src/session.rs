//! A [`Session`] owns the filter settings shared by the tracks it opens.
//!
//! Changing the thresholds through the session (or any of its tracks)
//! invalidates the filtered peaks of every track opened by it.

use std::sync::Arc;

use tracing::info;

use crate::{
    config::TrackConfig,
    filter::{FilterSettings, FilterState},
    ranges::{Interval, Peak},
    track::PeakTrack,
    traits::FeatureSource,
    view::FilteredView,
};

#[derive(Debug, Default)]
pub struct Session {
    settings: Arc<FilterSettings>,
}

impl Session {
    pub fn new(state: FilterState) -> Self {
        Self {
            settings: FilterSettings::shared(state),
        }
    }

    /// Create a new session with the thresholds of `config`.
    pub fn from_config(config: &TrackConfig) -> Self {
        Self::new(config.filter_state())
    }

    pub fn settings(&self) -> &Arc<FilterSettings> {
        &self.settings
    }

    pub fn filter_state(&self) -> FilterState {
        self.settings.state()
    }

    pub fn set_filter_state(&self, score_threshold: f32, fold_change_threshold: f32) {
        self.settings
            .set(FilterState::new(score_threshold, fold_change_threshold));
    }

    fn view<I>(&self, peaks: I) -> Arc<FilteredView<Peak>>
    where
        I: IntoIterator<Item = Interval<Peak>>,
    {
        Arc::new(FilteredView::new(peaks, Arc::clone(&self.settings)))
    }

    /// Open a peak-only track.
    pub fn open_track<I>(&self, name: &str, peaks: I) -> PeakTrack
    where
        I: IntoIterator<Item = Interval<Peak>>,
    {
        let track = PeakTrack::new(name, self.view(peaks));
        info!(name, peaks = track.peaks().len(), "opened peak track");
        track
    }

    /// Open a track pairing `peaks` with a signal source.
    pub fn open_track_with_signal<I, S>(&self, name: &str, peaks: I, signal: S) -> PeakTrack<S>
    where
        I: IntoIterator<Item = Interval<Peak>>,
        S: FeatureSource,
    {
        let track = PeakTrack::with_signal(name, self.view(peaks), signal);
        info!(name, peaks = track.peaks().len(), "opened peak track with signal");
        track
    }
}
