//! Filter thresholds, the shared [`FilterSettings`] invalidation token, and
//! the built-in [`FilterPredicate`]s.
//!
//! # Design
//!
//! Every [`FilteredView`] that should react to the same threshold changes
//! holds an [`Arc`] of one [`FilterSettings`]. Changing the thresholds bumps
//! an epoch counter in the same write as the new state, and views tag each
//! cached filtered list with the epoch it was built under. A reader takes a
//! single `(state, epoch)` snapshot, so it can never see a new state paired
//! with a list built under the old one.
//!
//! [`FilteredView`]: crate::view::FilteredView

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::traits::{FilterPredicate, Scored};

/// Score and fold-change thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterState {
    pub score_threshold: f32,
    pub fold_change_threshold: f32,
}

impl FilterState {
    pub fn new(score_threshold: f32, fold_change_threshold: f32) -> Self {
        Self {
            score_threshold,
            fold_change_threshold,
        }
    }

    /// Whether no filtering is in effect, i.e. both thresholds are at or
    /// below zero (the defaults).
    pub fn is_permissive(&self) -> bool {
        self.score_threshold <= 0.0 && self.fold_change_threshold <= 0.0
    }
}

/// A [`FilterState`] together with the epoch it was set in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSnapshot {
    pub state: FilterState,
    pub epoch: u64,
}

/// The shared, mutable filter thresholds for a group of views.
#[derive(Debug)]
pub struct FilterSettings {
    current: RwLock<FilterSnapshot>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::new(FilterState::default())
    }
}

impl FilterSettings {
    pub fn new(state: FilterState) -> Self {
        Self {
            current: RwLock::new(FilterSnapshot { state, epoch: 0 }),
        }
    }

    /// Create new settings wrapped in an [`Arc`], ready to be shared.
    pub fn shared(state: FilterState) -> Arc<Self> {
        Arc::new(Self::new(state))
    }

    /// The current state and epoch, read together.
    pub fn snapshot(&self) -> FilterSnapshot {
        // the snapshot is plain data, so a poisoned lock still holds a
        // consistent value
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FilterState {
        self.snapshot().state
    }

    pub fn epoch(&self) -> u64 {
        self.snapshot().epoch
    }

    /// Replace the thresholds, invalidating every filtered list built under
    /// earlier thresholds. Setting an identical state still invalidates.
    pub fn set(&self, state: FilterState) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.state = state;
        current.epoch += 1;
        info!(
            score_threshold = state.score_threshold,
            fold_change_threshold = state.fold_change_threshold,
            epoch = current.epoch,
            "filter thresholds changed"
        );
    }

    pub fn set_score_threshold(&self, score_threshold: f32) {
        let state = FilterState {
            score_threshold,
            ..self.state()
        };
        self.set(state)
    }

    pub fn set_fold_change_threshold(&self, fold_change_threshold: f32) {
        let state = FilterState {
            fold_change_threshold,
            ..self.state()
        };
        self.set(state)
    }
}

/// The default peak filter: keep a payload iff its score is at least the
/// score threshold and its fold change (when it has one) is at least the
/// fold-change threshold.
///
/// Under permissive thresholds every payload passes, so callers may skip
/// filtering altogether without changing results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdFilter;

impl<U: Scored> FilterPredicate<U> for ThresholdFilter {
    fn passes(&self, data: &U, state: &FilterState) -> bool {
        if state.is_permissive() {
            return true;
        }
        data.score() >= state.score_threshold
            && data
                .fold_change()
                .map_or(true, |fold_change| fold_change >= state.fold_change_threshold)
    }

    fn is_pass_through(&self, state: &FilterState) -> bool {
        state.is_permissive()
    }
}

/// A predicate that keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassAll;

impl<U> FilterPredicate<U> for PassAll {
    fn passes(&self, _data: &U, _state: &FilterState) -> bool {
        true
    }

    fn is_pass_through(&self, _state: &FilterState) -> bool {
        true
    }
}
