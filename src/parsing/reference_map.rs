//! Reference table loading.
//!
//! Tables are CSV with a header row. Extra columns are ignored. Row numbers in
//! errors are file line numbers, so the first data row is row 2.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::core::reference::{ReferenceEntry, ReferenceSet};
use crate::parsing::ParseError;

#[derive(Debug, Deserialize)]
struct TargetRow {
    sequence: String,
    target: String,
}

#[derive(Debug, Deserialize)]
struct PlateRow {
    index: String,
    index2: String,
    target: String,
}

/// Both barcode tables of a plate, read from one plate map
#[derive(Debug, Clone)]
pub struct PlateMap {
    pub index1: ReferenceSet,
    pub index2: ReferenceSet,
}

/// Load a `sequence,target` table
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::MissingColumn`
/// if a required column is absent, or `ParseError::InvalidRow` for a malformed row.
pub fn load_reference_table(path: &Path) -> Result<ReferenceSet, ParseError> {
    let file = std::fs::File::open(path)?;
    parse_reference_table(file, &path.display().to_string())
}

/// Parse a `sequence,target` table from any reader
///
/// # Errors
///
/// Returns `ParseError::MissingColumn` if a required column is absent, or
/// `ParseError::InvalidRow` for a malformed row.
pub fn parse_reference_table<R: Read>(reader: R, table: &str) -> Result<ReferenceSet, ParseError> {
    let rows: Vec<(usize, TargetRow)> = read_rows(reader, table, &["sequence", "target"])?;
    let entries = rows
        .into_iter()
        .map(|(row, r)| ReferenceEntry::new(r.sequence, r.target, row))
        .collect();
    Ok(ReferenceSet::new(table, entries))
}

/// Load an `index,index2,target` plate map
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::MissingColumn`
/// if a required column is absent, or `ParseError::InvalidRow` for a malformed row.
pub fn load_plate_map(path: &Path) -> Result<PlateMap, ParseError> {
    let file = std::fs::File::open(path)?;
    parse_plate_map(file, &path.display().to_string())
}

/// Parse an `index,index2,target` plate map from any reader
///
/// # Errors
///
/// Returns `ParseError::MissingColumn` if a required column is absent, or
/// `ParseError::InvalidRow` for a malformed row.
pub fn parse_plate_map<R: Read>(reader: R, table: &str) -> Result<PlateMap, ParseError> {
    let rows: Vec<(usize, PlateRow)> = read_rows(reader, table, &["index", "index2", "target"])?;

    let mut index1 = Vec::with_capacity(rows.len());
    let mut index2 = Vec::with_capacity(rows.len());
    for (row, r) in rows {
        index1.push(ReferenceEntry::new(r.index, r.target.clone(), row));
        index2.push(ReferenceEntry::new(r.index2, r.target, row));
    }

    Ok(PlateMap {
        index1: ReferenceSet::new(format!("{table} (index)"), index1),
        index2: ReferenceSet::new(format!("{table} (index2)"), index2),
    })
}

/// Deserialize every data row, paired with its line number
fn read_rows<T, R>(reader: R, table: &str, required: &[&str]) -> Result<Vec<(usize, T)>, ParseError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ParseError::InvalidFormat(format!("{table}: {e}")))?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(ParseError::MissingColumn {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let fallback_row = i + 2;
        let record = result.map_err(|e| ParseError::InvalidRow {
            table: table.to_string(),
            row: e
                .position()
                .and_then(|p| usize::try_from(p.line()).ok())
                .unwrap_or(fallback_row),
            message: e.to_string(),
        })?;
        let row = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(fallback_row);

        let parsed: T = record
            .deserialize(Some(&headers))
            .map_err(|e| ParseError::InvalidRow {
                table: table.to_string(),
                row,
                message: e.to_string(),
            })?;
        rows.push((row, parsed));
    }

    Ok(rows)
}
