use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

use crate::core::sequence::truncate_read;
use crate::core::types::MatchField;
use crate::dictionary::store::{Dictionary, VariantRecord};

/// Text used for reads that matched no dictionary key
pub const UNMATCHED: &str = "NA";

/// The result of looking up one read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    Matched(String),
    Unmatched,
}

impl MatchOutcome {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Matched(value) => value,
            Self::Unmatched => UNMATCHED,
        }
    }
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Matched values sort by name; unmatched sorts after all of them
impl Ord for MatchOutcome {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Matched(a), Self::Matched(b)) => a.cmp(b),
            (Self::Matched(_), Self::Unmatched) => Ordering::Less,
            (Self::Unmatched, Self::Matched(_)) => Ordering::Greater,
            (Self::Unmatched, Self::Unmatched) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MatchOutcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for MatchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Looks up observed reads in a prebuilt dictionary
pub struct SequenceMatcher<'a> {
    dictionary: &'a Dictionary,
    field: MatchField,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(dictionary: &'a Dictionary, field: MatchField) -> Self {
        Self { dictionary, field }
    }

    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        self.dictionary
    }

    /// The full record explaining a read, if any.
    ///
    /// Reads longer than the key width are truncated first.
    #[must_use]
    pub fn classify(&self, read: &str) -> Option<&'a VariantRecord> {
        self.dictionary
            .get(truncate_read(read, self.dictionary.key_width()))
    }

    #[must_use]
    pub fn match_one(&self, read: &str) -> MatchOutcome {
        match self.classify(read) {
            Some(record) => MatchOutcome::Matched(record.field(self.field).to_string()),
            None => MatchOutcome::Unmatched,
        }
    }

    /// Match every read, one outcome per read in input order
    pub fn match_reads<S: AsRef<str>>(&self, reads: &[S]) -> Vec<MatchOutcome> {
        reads.iter().map(|r| self.match_one(r.as_ref())).collect()
    }

    /// Parallel [`match_reads`](Self::match_reads); output order follows input order
    pub fn par_match_reads<S: AsRef<str> + Sync>(&self, reads: &[S]) -> Vec<MatchOutcome> {
        reads.par_iter().map(|r| self.match_one(r.as_ref())).collect()
    }
}
