//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod parsers;
pub mod tsv;

pub use file::{get_base_extension, InputFile, OutputFile};
pub use parsers::{read_bedgraph, read_peaks, PeakFile};
