//! Essential TSV parsing functionality, which wraps the [`csv`] crate's
//! deserialization method using [`serde`].

use csv::{Reader, ReaderBuilder, StringRecord};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::file::InputFile;
use crate::error::PeakViewError;

/// Build a TSV reader which ignores `#` comment lines and works on
/// gzip-compressed files. Records may have differing numbers of columns.
pub fn build_tsv_reader(filepath: impl AsRef<Path>) -> Result<Reader<Box<dyn Read>>, PeakViewError> {
    let stream: Box<dyn Read> = Box::new(InputFile::new(filepath.as_ref()).reader()?);
    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(stream);
    Ok(reader)
}

/// Whether a record is a UCSC `track` or `browser` line rather than data.
pub fn is_track_line(record: &StringRecord) -> bool {
    record
        .get(0)
        .map_or(false, |first| first.starts_with("track") || first.starts_with("browser"))
}

/// Read every data record of a TSV file, skipping `track`/`browser` lines.
pub fn read_records(filepath: impl AsRef<Path>) -> Result<Vec<StringRecord>, PeakViewError> {
    let mut reader = build_tsv_reader(filepath)?;
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if !is_track_line(&record) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Deserialize every data record of a TSV file into `T`.
pub fn deserialize_records<T: DeserializeOwned>(
    filepath: impl AsRef<Path>,
) -> Result<Vec<T>, PeakViewError> {
    read_records(filepath)?
        .iter()
        .map(|record| Ok(record.deserialize::<T>(None)?))
        .collect()
}

/// Deserializes some value of type `T` with some possible missing
/// character `missing_chars` into [`Option<T>`].
pub fn deserialize_option_generic<'de, D, T>(
    deserializer: D,
    missing_chars: &[&str],
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if missing_chars.contains(&s.as_str()) {
        Ok(None)
    } else {
        s.parse::<T>()
            .map(Some)
            .map_err(|e| DeError::custom(format!("parsing error: {}", e)))
    }
}

/// [`serde`] deserializer for a BED-like column where `'.'` marks a missing
/// value.
pub fn deserialize_bed_missing<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    deserialize_option_generic(deserializer, &["."])
}
