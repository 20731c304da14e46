//! The command line subcommands, as library functions.
//!
//! Each command reads its inputs, runs queries through a [`Session`], writes
//! TSV to a file or standard output, and returns a [`Report`] for the user.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    error::PeakViewError,
    filter::FilterState,
    io::{read_bedgraph, read_peaks, OutputFile},
    reporting::{CommandOutput, Report},
    session::Session,
    sources::MemorySource,
    track::PeakTrack,
    traits::{GenericRange, TsvSerialize},
    Position,
};

/// A genomic region, written `seqname:start-end`. Commas in the positions
/// are ignored, so `chr1:1,000-2,000` is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
}

impl FromStr for Region {
    type Err = PeakViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeakViewError::InvalidRegion(s.to_string());
        let (seqname, range) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        if seqname.is_empty() {
            return Err(invalid());
        }
        let parse = |x: &str| x.replace(',', "").trim().parse::<Position>().map_err(|_| invalid());
        let (start, end) = (parse(start)?, parse(end)?);
        if start > end {
            return Err(PeakViewError::InvalidGenomicRange(start, end));
        }
        Ok(Region {
            seqname: seqname.to_string(),
            start,
            end,
        })
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.seqname, self.start, self.end)
    }
}

fn output_file(output: Option<&PathBuf>) -> OutputFile {
    output.map_or(OutputFile::new_stdout(None), |file| OutputFile::new(file, None))
}

fn open_peaks(peaks: &PathBuf, state: FilterState) -> Result<(Session, PeakTrack), PeakViewError> {
    let session = Session::new(state);
    let name = peaks.to_string_lossy().to_string();
    let track = session.open_track(&name, read_peaks(peaks)?);
    Ok((session, track))
}

/// Write every peak passing the thresholds, sequence by sequence.
pub fn peakview_filter(
    peaks: &PathBuf,
    state: FilterState,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, PeakViewError> {
    let (_session, track) = open_peaks(peaks, state)?;
    let mut writer = output_file(output).writer()?;
    let mut report = Report::new();

    let mut kept = 0;
    for seqname in track.peaks().seqnames() {
        if let Some(filtered) = track.get_filtered(&seqname) {
            for peak in filtered.iter() {
                writeln!(writer, "{}", peak.to_tsv())?;
            }
            kept += filtered.len();
        }
    }
    writer.flush()?;

    let total = track.peaks().len();
    if kept < total {
        report.add_issue(format!(
            "{} of {} peaks were removed by the thresholds",
            total - kept,
            total
        ));
    }
    Ok(CommandOutput::new((), report))
}

/// Write the filtered peaks overlapping `region`.
pub fn peakview_overlaps(
    peaks: &PathBuf,
    region: &Region,
    state: FilterState,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, PeakViewError> {
    let (_session, track) = open_peaks(peaks, state)?;
    let mut writer = output_file(output).writer()?;
    let mut report = Report::new();

    if track.get_filtered(&region.seqname).is_none() {
        report.add_issue(format!("no peaks on sequence '{}'", region.seqname));
    }
    for peak in track.overlapping(&region.seqname, region.start, region.end) {
        writeln!(writer, "{}", peak.to_tsv())?;
    }
    writer.flush()?;
    Ok(CommandOutput::new((), report))
}

/// Write the filtered peak nearest to `position`, with its distance, if one
/// is closer than `max_distance`.
pub fn peakview_nearest(
    peaks: &PathBuf,
    seqname: &str,
    position: Position,
    max_distance: Position,
    state: FilterState,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, PeakViewError> {
    let (_session, track) = open_peaks(peaks, state)?;
    let mut writer = output_file(output).writer()?;
    let mut report = Report::new();

    match track.nearest(seqname, position, max_distance) {
        Some(peak) => writeln!(writer, "{}\t{}", peak.to_tsv(), peak.distance_to(position))?,
        None => report.add_issue(format!(
            "no peak within {} bp of {}:{}",
            max_distance, seqname, position
        )),
    }
    writer.flush()?;
    Ok(CommandOutput::new((), report))
}

/// Write the maximum score of the filtered peaks overlapping `region`, or
/// `.` if there are none.
pub fn peakview_region_max(
    peaks: &PathBuf,
    region: &Region,
    state: FilterState,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, PeakViewError> {
    let (_session, track) = open_peaks(peaks, state)?;
    let mut writer = output_file(output).writer()?;

    let max_score = track.max_score_in_region(&region.seqname, region.start, region.end);
    writeln!(writer, "{}\t{}", region, max_score.to_tsv())?;
    writer.flush()?;
    Ok(CommandOutput::new((), Report::new()))
}

/// Write the signal bins overlapping `region`, masked by the filtered peaks.
pub fn peakview_signal(
    peaks: &PathBuf,
    signal: &PathBuf,
    region: &Region,
    zoom: i32,
    state: FilterState,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, PeakViewError> {
    let session = Session::new(state);
    let name = peaks.to_string_lossy().to_string();
    let source = MemorySource::new(read_bedgraph(signal)?);
    let track = session.open_track_with_signal(&name, read_peaks(peaks)?, source);

    let mut writer = output_file(output).writer()?;
    let mut report = Report::new();

    let bins = track.signal(&region.seqname, region.start, region.end, zoom)?;
    for bin in &bins {
        writeln!(writer, "{}", bin.to_tsv())?;
    }
    writer.flush()?;

    if bins.is_empty() {
        report.add_issue(format!("no signal in {} under the filtered peaks", region));
    }
    if let Some((min, max)) = track.signal_data_range() {
        report.add_issue(format!("signal data range: {} to {}", min, max));
    }
    Ok(CommandOutput::new((), report))
}
