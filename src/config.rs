//! Track configuration, loaded from a TOML file.
//!
//! ```toml
//! score_threshold = 30.0
//! fold_change_threshold = 2.0
//! nearest_max_distance = 5000
//! zoom = 0
//! ```
//!
//! Every key is optional; missing keys take their [`Default`] values.

use std::path::Path;

use serde::Deserialize;

use crate::{error::PeakViewError, filter::FilterState, Position};

/// The default window for nearest-feature searches, in base pairs.
pub const DEFAULT_NEAREST_MAX_DISTANCE: Position = 2_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackConfig {
    pub score_threshold: f32,
    pub fold_change_threshold: f32,
    pub nearest_max_distance: Position,
    pub zoom: i32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.0,
            fold_change_threshold: 0.0,
            nearest_max_distance: DEFAULT_NEAREST_MAX_DISTANCE,
            zoom: 0,
        }
    }
}

impl TrackConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, PeakViewError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PeakViewError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// The [`FilterState`] given by the configured thresholds.
    pub fn filter_state(&self) -> FilterState {
        FilterState::new(self.score_threshold, self.fold_change_threshold)
    }
}
