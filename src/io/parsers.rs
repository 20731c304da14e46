//! Peak and signal file parsing.
//!
//! Supported formats, detected from the file extension (ignoring `.gz` and
//! `.bgz`):
//!
//!  - `.narrowPeak`: ENCODE narrowPeak (BED6+4). The score is column 5 and
//!    the fold change is the `signalValue`, column 7.
//!  - `.bed`: BED5 peaks (name and score, no fold change). Columns past the
//!    fifth are ignored.
//!  - `.bedGraph` / `.bdg`: signal bins with one value each.
//!

use serde::de::IgnoredAny;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::file::get_base_extension;
use super::tsv::{deserialize_bed_missing, deserialize_records, read_records};
use crate::{
    error::PeakViewError,
    ranges::{Interval, Peak, SignalValue},
    Position,
};

/// Enum that indicates the filetype of a peak or signal file.
#[derive(Debug, Clone, PartialEq)]
pub enum PeakFile {
    NarrowPeak(PathBuf),
    Bed5(PathBuf),
    BedGraph(PathBuf),
}

impl PeakFile {
    /// Detect the file type from the extension.
    pub fn detect(filepath: impl Into<PathBuf>) -> Result<Self, PeakViewError> {
        let filepath: PathBuf = filepath.into();
        let extension = get_base_extension(&filepath).unwrap_or_default();
        match extension.to_lowercase().as_str() {
            "narrowpeak" => Ok(PeakFile::NarrowPeak(filepath)),
            "bed" => Ok(PeakFile::Bed5(filepath)),
            "bedgraph" | "bdg" => Ok(PeakFile::BedGraph(filepath)),
            _ => Err(PeakViewError::UnsupportedPeakFileFormat(
                filepath.to_string_lossy().to_string(),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PeakFile::NarrowPeak(path) | PeakFile::Bed5(path) | PeakFile::BedGraph(path) => path,
        }
    }
}

/// One narrowPeak line.
#[derive(Debug, Deserialize)]
struct NarrowPeakRecord {
    seqname: String,
    start: Position,
    end: Position,
    #[serde(deserialize_with = "deserialize_bed_missing")]
    name: Option<String>,
    score: f32,
    _strand: IgnoredAny,
    #[serde(deserialize_with = "deserialize_bed_missing")]
    signal_value: Option<f32>,
    _p_value: IgnoredAny,
    _q_value: IgnoredAny,
    _peak: IgnoredAny,
}

impl NarrowPeakRecord {
    fn into_interval(self) -> Result<Interval<Peak>, PeakViewError> {
        // -1 means "not assigned" for narrowPeak statistics
        let fold_change = self.signal_value.filter(|value| *value >= 0.0);
        let mut peak = Peak::new(self.score, fold_change);
        peak.name = self.name;
        Interval::new(self.seqname, self.start, self.end, peak)
    }
}

/// One bedGraph line.
#[derive(Debug, Deserialize)]
struct BedGraphRecord {
    seqname: String,
    start: Position,
    end: Position,
    value: f32,
}

fn parse_column<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
) -> Result<T, PeakViewError>
where
    PeakViewError: From<T::Err>,
{
    let column = record
        .get(index)
        .ok_or_else(|| PeakViewError::BedlikeTooFewColumns(record.len(), line_of(record)))?;
    Ok(column.trim().parse::<T>()?)
}

fn line_of(record: &csv::StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join("\t")
}

fn read_narrowpeak(filepath: &Path) -> Result<Vec<Interval<Peak>>, PeakViewError> {
    deserialize_records::<NarrowPeakRecord>(filepath)?
        .into_iter()
        .map(NarrowPeakRecord::into_interval)
        .collect()
}

fn read_bed5(filepath: &Path) -> Result<Vec<Interval<Peak>>, PeakViewError> {
    read_records(filepath)?
        .iter()
        .map(|record| {
            if record.len() < 5 {
                return Err(PeakViewError::BedlikeTooFewColumns(
                    record.len(),
                    line_of(record),
                ));
            }
            let mut peak = Peak::new(parse_column(record, 4)?, None);
            let name = &record[3];
            if name != "." {
                peak = peak.with_name(name);
            }
            Interval::new(&record[0], parse_column(record, 1)?, parse_column(record, 2)?, peak)
        })
        .collect()
}

/// Read the peaks of a narrowPeak or BED5 file.
pub fn read_peaks(filepath: impl Into<PathBuf>) -> Result<Vec<Interval<Peak>>, PeakViewError> {
    let peak_file = PeakFile::detect(filepath)?;
    let peaks = match &peak_file {
        PeakFile::NarrowPeak(path) => read_narrowpeak(path)?,
        PeakFile::Bed5(path) => read_bed5(path)?,
        PeakFile::BedGraph(path) => {
            return Err(PeakViewError::UnsupportedPeakFileFormat(format!(
                "{} is a signal file, not a peak file",
                path.display()
            )))
        }
    };
    if peaks.is_empty() {
        warn!(path = %peak_file.path().display(), "peak file has no records");
    }
    info!(path = %peak_file.path().display(), n = peaks.len(), "read peaks");
    Ok(peaks)
}

/// Read the bins of a bedGraph signal file.
pub fn read_bedgraph(
    filepath: impl Into<PathBuf>,
) -> Result<Vec<Interval<SignalValue>>, PeakViewError> {
    let path = match PeakFile::detect(filepath)? {
        PeakFile::BedGraph(path) => path,
        other => {
            return Err(PeakViewError::UnsupportedPeakFileFormat(format!(
                "{} is a peak file, not a bedGraph file",
                other.path().display()
            )))
        }
    };
    let bins = deserialize_records::<BedGraphRecord>(&path)?
        .into_iter()
        .map(|record| {
            Interval::new(
                record.seqname,
                record.start,
                record.end,
                SignalValue::new(record.value),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    if bins.is_empty() {
        warn!(path = %path.display(), "bedGraph file has no records");
    }
    info!(path = %path.display(), n = bins.len(), "read signal bins");
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GenericRange;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_detect() {
        assert!(matches!(PeakFile::detect("a.narrowPeak.gz"), Ok(PeakFile::NarrowPeak(_))));
        assert!(matches!(PeakFile::detect("a.bed"), Ok(PeakFile::Bed5(_))));
        assert!(matches!(PeakFile::detect("a.bdg"), Ok(PeakFile::BedGraph(_))));
        assert!(matches!(
            PeakFile::detect("a.vcf"),
            Err(PeakViewError::UnsupportedPeakFileFormat(_))
        ));
    }

    #[test]
    fn test_read_narrowpeak() {
        let file = temp_file(
            ".narrowPeak",
            "chr1\t100\t200\tpeak_1\t50\t.\t4.5\t10.1\t8.2\t50\n\
             chr1\t300\t400\t.\t80\t.\t-1\t-1\t-1\t-1\n",
        );
        let peaks = read_peaks(file.path()).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].as_tuple(), (100, 200));
        assert_eq!(peaks[0].data().name.as_deref(), Some("peak_1"));
        assert_eq!(peaks[0].data().fold_change, Some(4.5));
        assert_eq!(peaks[1].data().name, None);
        assert_eq!(peaks[1].data().fold_change, None);
        assert_eq!(peaks[1].data().score, 80.0);
    }

    #[test]
    fn test_read_bed5() {
        let file = temp_file(".bed", "# peaks\nchr2\t5\t15\tp1\t40\t+\nchr2\t1\t3\t.\t7\n");
        let peaks = read_peaks(file.path()).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].data(), &Peak::new(40.0, None).with_name("p1"));
        assert_eq!(peaks[1].data().name, None);
    }

    #[test]
    fn test_read_bed3_is_an_error() {
        let file = temp_file(".bed", "chr2\t5\t15\n");
        assert!(matches!(
            read_peaks(file.path()),
            Err(PeakViewError::BedlikeTooFewColumns(3, _))
        ));
    }

    #[test]
    fn test_inverted_range_is_an_error() {
        let file = temp_file(".bed", "chr2\t15\t5\tp\t1\n");
        assert!(matches!(
            read_peaks(file.path()),
            Err(PeakViewError::InvalidGenomicRange(15, 5))
        ));
    }

    #[test]
    fn test_read_bedgraph() {
        let file = temp_file(
            ".bedGraph",
            "track type=bedGraph\nchr1\t0\t25\t1.5\nchr1\t25\t50\t0\n",
        );
        let bins = read_bedgraph(file.path()).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].data().value, 1.5);
        assert!(read_peaks(file.path()).is_err());
    }
}
