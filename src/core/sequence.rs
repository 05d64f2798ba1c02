//! Nucleotide sequence helpers shared by the dictionary builder and the readers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bases accepted in reference sequences regardless of the substitution alphabet
pub const IUPAC_CORE_BASES: &[char] = &['A', 'C', 'G', 'T', 'N'];

/// Default substitution alphabet. `N` is last so that it is the replacement
/// used when a candidate symbol would reproduce the original base.
pub const DEFAULT_ALPHABET: &str = "ATGCN";

/// Bases inserted when generating insertion variants
pub const INSERTION_BASES: &[char] = &['A', 'T', 'G', 'C'];

/// Minimum raw reference length: one flank base on each side of a non-empty core
pub const MIN_REFERENCE_LENGTH: usize = 3;

/// An ordered set of symbols used for substitution variants.
///
/// Serialized as a string of its symbols; deserialization applies the same
/// checks as [`Alphabet::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet(Vec<char>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid alphabet '{0}': must be non-empty with no repeated symbols")]
pub struct InvalidAlphabet(pub String);

impl TryFrom<String> for Alphabet {
    type Error = InvalidAlphabet;

    fn try_from(symbols: String) -> Result<Self, Self::Error> {
        Self::new(&symbols).ok_or(InvalidAlphabet(symbols))
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.0.into_iter().collect()
    }
}

impl Alphabet {
    /// Build an alphabet from its symbols, upper-cased.
    ///
    /// Returns `None` if the alphabet is empty or repeats a symbol.
    #[must_use]
    pub fn new(symbols: &str) -> Option<Self> {
        let symbols: Vec<char> = symbols.chars().map(|c| c.to_ascii_uppercase()).collect();
        if symbols.is_empty() {
            return None;
        }
        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return None;
            }
        }
        Some(Self(symbols))
    }

    #[must_use]
    pub fn symbols(&self) -> &[char] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self(DEFAULT_ALPHABET.chars().collect())
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in &self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Complement of a single base. Anything other than `ACGT` is returned unchanged.
#[must_use]
pub fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

/// Reverse complement of a DNA sequence
#[must_use]
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement).collect()
}

/// Number of positions at which two sequences differ.
///
/// Sequences of unequal length are compared over the shorter length.
#[must_use]
pub fn hamming_distance(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}

/// Truncate a read to at most `width` bases
#[must_use]
pub fn truncate_read(read: &str, width: usize) -> &str {
    match read.char_indices().nth(width) {
        Some((idx, _)) => &read[..idx],
        None => read,
    }
}
