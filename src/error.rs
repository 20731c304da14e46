//! The [`PeakViewError`] `enum` definition and error messages.
//!
use crate::Position;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// The [`PeakViewError`] defines the standard set of errors that should
/// be passed to the user.
///
/// Note that empty query windows (`end < start`) and sequences that have no
/// loaded data are *not* errors: queries return empty results for these.
#[derive(Debug, Error)]
pub enum PeakViewError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TSV parsing error: {0}")]
    TsvError(#[from] csv::Error),

    // File parsing related errors
    #[error("Could not detect peak or signal filetype from extension: {0}")]
    UnsupportedPeakFileFormat(String),
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Float parsing error: {0}")]
    ParseFloatError(#[from] ParseFloatError),
    #[error("Bed-like file has too few columns ({0}). The first three columns must be sequence name, and start and end positions.\nLine: {1}")]
    BedlikeTooFewColumns(usize, String),

    // Invalid genomic range errors
    #[error("Range invalid: start ({0}) must not be greater than end ({1})")]
    InvalidGenomicRange(Position, Position),
    #[error("Region '{0}' is invalid: expected 'seqname:start-end'")]
    InvalidRegion(String),

    // Feature source errors
    #[error("Feature source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Time point {0} is out of range: the track has {1} time points")]
    TimePointOutOfRange(usize, usize),

    // Configuration and command line tool related errors
    #[error("Configuration file error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}
