//! CSV reports of an analysis.
//!
//! - `results.csv`: `index1,index2,amplicon,count`, one row per combination
//! - `top_unaligned_{i1,i2,amps}.csv`: `sequence,count`, debug mode only

use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::types::Channel;
use crate::matching::{CountTable, UnmatchedCount};
use crate::pipeline::AnalysisResult;

pub const RESULTS_FILE: &str = "results.csv";

#[must_use]
pub fn unmatched_file_name(channel: Channel) -> String {
    format!("top_unaligned_{}.csv", channel.short_name())
}

/// Write the count table as CSV
///
/// # Errors
///
/// Returns a `csv::Error` if a row cannot be written.
pub fn write_count_table<W: Write>(writer: W, counts: &CountTable) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if counts.is_empty() {
        csv_writer.write_record(["index1", "index2", "amplicon", "count"])?;
    }
    for row in counts.rows() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render the count table as a CSV string
///
/// # Errors
///
/// Returns a `csv::Error` if a row cannot be written.
pub fn count_table_csv(counts: &CountTable) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_count_table(&mut buf, counts)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write one channel's unmatched report as CSV
///
/// # Errors
///
/// Returns a `csv::Error` if a row cannot be written.
pub fn write_unmatched<W: Write>(writer: W, rows: &[UnmatchedCount]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(["sequence", "count"])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write every report of an analysis into `dir`, returning the files written
///
/// # Errors
///
/// Returns an error naming the file that could not be written.
pub fn write_reports(dir: &Path, result: &AnalysisResult) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();

    let path = dir.join(RESULTS_FILE);
    let file = std::fs::File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_count_table(file, &result.counts).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(path);

    if let Some(unmatched) = &result.unmatched {
        for (channel, rows) in unmatched {
            let path = dir.join(unmatched_file_name(*channel));
            let file =
                std::fs::File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_unmatched(file, rows).with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }
    }

    for path in &written {
        debug!("Wrote {}", path.display());
    }
    Ok(written)
}
