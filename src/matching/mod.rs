//! Read matching and aggregation.
//!
//! - [`SequenceMatcher`]: looks reads up in a prebuilt dictionary
//! - [`MatchOutcome`]: the reported field of the matched record, or unmatched
//! - [`aggregate`]: counts read-aligned outcomes of the three channels
//!
//! ## Example
//!
//! ```rust
//! use amplicount::core::reference::ReferenceSet;
//! use amplicount::core::types::MatchField;
//! use amplicount::dictionary::builder::{BuildConfig, DictionaryBuilder};
//! use amplicount::matching::{aggregate, MatchOutcome, SequenceMatcher};
//!
//! let wells = ReferenceSet::from_pairs("wells.csv", [("GACGTC", "A1")]);
//! let dictionary = DictionaryBuilder::new(BuildConfig::default()).build(&wells).unwrap();
//! let matcher = SequenceMatcher::new(&dictionary, MatchField::Label);
//!
//! let outcomes = matcher.match_reads(&["ACGT", "ACGA", "GGGG"]);
//! assert_eq!(outcomes[2], MatchOutcome::Unmatched);
//!
//! let table = aggregate(&outcomes, &outcomes, &outcomes).unwrap();
//! assert_eq!(table.total(), 3);
//! ```

pub mod aggregate;
pub mod engine;

pub use aggregate::{
    aggregate, top_unmatched, AggregateError, CountKey, CountRow, CountTable, UnmatchedCount, TOP_UNMATCHED,
};
pub use engine::{MatchOutcome, SequenceMatcher};
