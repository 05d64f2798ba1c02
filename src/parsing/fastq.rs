//! FASTQ reading with noodles.
//!
//! Only the sequence line of each record is kept. Files ending in `.gz` are
//! decompressed on the fly.

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fastq;

use crate::parsing::ParseError;

#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".gz")
}

/// Read the upper-cased sequences of a FASTQ file, each cut to at most `max_width` bases.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, or `ParseError::Noodles`
/// if a record is malformed.
pub fn read_sequences(path: &Path, max_width: Option<usize>) -> Result<Vec<String>, ParseError> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        read_sequences_from(BufReader::new(MultiGzDecoder::new(file)), max_width)
    } else {
        read_sequences_from(BufReader::new(file), max_width)
    }
}

/// Read sequences from any buffered FASTQ source
///
/// # Errors
///
/// Returns `ParseError::Noodles` if a record is malformed.
pub fn read_sequences_from<R: BufRead>(reader: R, max_width: Option<usize>) -> Result<Vec<String>, ParseError> {
    let mut fastq_reader = fastq::io::Reader::new(reader);
    let mut sequences = Vec::new();

    for result in fastq_reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTQ record {}: {e}", sequences.len() + 1)))?;

        let bases = record.sequence();
        let width = max_width.map_or(bases.len(), |w| w.min(bases.len()));
        let sequence: String = bases[..width]
            .iter()
            .map(|b| char::from(b.to_ascii_uppercase()))
            .collect();
        sequences.push(sequence);
    }

    Ok(sequences)
}
