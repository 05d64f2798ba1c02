//! Readers for the files that make up a sequencing run.
//!
//! - **Reference tables** (CSV): amplicon maps with `sequence,target` columns,
//!   and plate maps with `index,index2,target` columns
//! - **FASTQ** (optionally gzip compressed): observed reads of one channel
//! - **RunParameters.xml**: the instrument chemistry, which fixes the strand
//!   index 2 is read on
//!
//! ## Example
//!
//! ```rust,no_run
//! use amplicount::parsing::fastq::read_sequences;
//! use amplicount::parsing::reference_map::load_reference_table;
//! use std::path::Path;
//!
//! let amplicons = load_reference_table(Path::new("amplicon_map.csv")).unwrap();
//! let reads = read_sequences(Path::new("out/Undetermined_S0_R1_001.fastq.gz"), Some(26)).unwrap();
//! ```

use thiserror::Error;

pub mod fastq;
pub mod reference_map;
pub mod run_parameters;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{table}, row {row}: {message}")]
    InvalidRow {
        table: String,
        row: usize,
        message: String,
    },

    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid CSV format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid XML: {0}")]
    Xml(String),

    #[error("{file}: no <{element}> element")]
    MissingElement { file: String, element: String },
}
