//! # amplicount
//!
//! A library for error-tolerant identification of barcodes and amplicons in
//! multiplexed amplicon sequencing runs.
//!
//! Every read of a run carries two barcodes (index 1 and index 2) naming the
//! well it came from, and an amplicon read naming the target it measures.
//! Sequencing errors mean reads rarely match their reference exactly, so
//! `amplicount` expands each reference table into a dictionary of every
//! sequence a small number of errors could turn it into. Identifying a read is
//! then a single hash lookup.
//!
//! ## Features
//!
//! - **Substitutions**: every variant within a configurable Hamming distance
//! - **Indels**: single-base deletions and insertions, kept at the core width
//! - **Ambiguity tracking**: variants explained by more than one error model are marked `Undetermined`
//! - **Parallel**: dictionaries are built, and reads matched, on the rayon pool
//! - **Reports**: per-combination counts and the most frequent unmatched reads
//!
//! ## Example
//!
//! ```rust
//! use amplicount::core::reference::ReferenceSet;
//! use amplicount::dictionary::builder::{BuildConfig, DictionaryBuilder};
//! use amplicount::matching::{MatchOutcome, SequenceMatcher};
//! use amplicount::MatchField;
//!
//! let amplicons = ReferenceSet::from_pairs(
//!     "amplicon_map.csv",
//!     [("GACGTACGC", "S2"), ("GTTTGGGAC", "RPP30")],
//! );
//! let dictionary = DictionaryBuilder::new(BuildConfig::default())
//!     .build(&amplicons)
//!     .unwrap();
//!
//! let matcher = SequenceMatcher::new(&dictionary, MatchField::Label);
//! // One substitution away from S2
//! assert_eq!(matcher.match_one("ACGTACC"), MatchOutcome::Matched("S2".into()));
//! assert_eq!(matcher.match_one("GGGGGGG"), MatchOutcome::Unmatched);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Reference entries, sequence helpers and shared enums
//! - [`dictionary`]: Variant generation, dictionary building and storage
//! - [`matching`]: Read lookup and count aggregation
//! - [`parsing`]: Reference tables, FASTQ and run parameters
//! - [`pipeline`]: End-to-end analysis of a run directory
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: HTTP service running analyses in the background

pub mod cli;
pub mod core;
pub mod dictionary;
pub mod matching;
pub mod parsing;
pub mod pipeline;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use core::reference::{ReferenceEntry, ReferenceSet};
pub use core::types::*;
pub use dictionary::builder::{BuildConfig, CollisionPolicy, DictionaryBuilder};
pub use dictionary::store::{Dictionary, VariantRecord};
pub use matching::{CountTable, MatchOutcome, SequenceMatcher};
