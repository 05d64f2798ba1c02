use serde::{Deserialize, Serialize};

use crate::core::sequence::reverse_complement;

/// A single row of a reference table: a raw sequence including one flank base
/// on each side, and the label reads matching it are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Upper-cased raw sequence, flanks included
    pub raw_sequence: String,

    /// Well position or amplicon name
    pub label: String,

    /// 1-based line number in the source table (header is line 1)
    pub row: usize,
}

impl ReferenceEntry {
    pub fn new(raw_sequence: impl AsRef<str>, label: impl Into<String>, row: usize) -> Self {
        Self {
            raw_sequence: raw_sequence.as_ref().trim().to_ascii_uppercase(),
            label: label.into(),
            row,
        }
    }

    /// Length of the matching core, or `None` if the sequence has no room for flanks
    #[must_use]
    pub fn core_length(&self) -> Option<usize> {
        self.raw_sequence.len().checked_sub(2).filter(|&l| l > 0)
    }

    /// Split the (optionally reverse-complemented) sequence into its matching core
    /// and the `core + trailing flank` window used for deletion variants.
    #[must_use]
    pub fn windows(&self, reverse: bool) -> Option<CoreWindow> {
        let oriented = if reverse {
            reverse_complement(&self.raw_sequence)
        } else {
            self.raw_sequence.clone()
        };

        let core_length = self.core_length()?;
        let with_flank = oriented.get(1..)?.to_string();
        let core = with_flank.get(..core_length)?.to_string();

        Some(CoreWindow { core, with_flank })
    }
}

/// The trimmed views of a reference entry used during dictionary generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreWindow {
    /// Sequence without its first and last base (length `L`)
    pub core: String,

    /// Core followed by the trailing flank base (length `L + 1`)
    pub with_flank: String,
}

/// An ordered list of reference entries loaded from one source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSet {
    /// Where the entries came from (usually a file path); used in error messages
    pub source: String,

    pub entries: Vec<ReferenceEntry>,
}

impl ReferenceSet {
    pub fn new(source: impl Into<String>, entries: Vec<ReferenceEntry>) -> Self {
        Self {
            source: source.into(),
            entries,
        }
    }

    /// Build a set from `(sequence, label)` pairs, numbering rows as a table with a header would
    pub fn from_pairs<S, L>(source: impl Into<String>, pairs: impl IntoIterator<Item = (S, L)>) -> Self
    where
        S: AsRef<str>,
        L: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (seq, label))| ReferenceEntry::new(seq, label, i + 2))
            .collect();
        Self::new(source, entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct labels in the set
    #[must_use]
    pub fn label_count(&self) -> usize {
        let labels: std::collections::HashSet<&str> =
            self.entries.iter().map(|e| e.label.as_str()).collect();
        labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_uppercased() {
        let entry = ReferenceEntry::new(" acgtac ", "A1", 2);
        assert_eq!(entry.raw_sequence, "ACGTAC");
        assert_eq!(entry.core_length(), Some(4));
    }

    #[test]
    fn test_windows_forward() {
        let entry = ReferenceEntry::new("GACGTC", "A1", 2);
        let window = entry.windows(false).unwrap();
        assert_eq!(window.core, "ACGT");
        assert_eq!(window.with_flank, "ACGTC");
    }

    #[test]
    fn test_windows_reverse_complement() {
        // revcomp(GAACCT) = AGGTTC
        let entry = ReferenceEntry::new("GAACCT", "A1", 2);
        let window = entry.windows(true).unwrap();
        assert_eq!(window.core, "GGTT");
        assert_eq!(window.with_flank, "GGTTC");
    }

    #[test]
    fn test_windows_too_short() {
        assert!(ReferenceEntry::new("AC", "A1", 2).windows(false).is_none());
        assert!(ReferenceEntry::new("", "A1", 2).windows(false).is_none());
        assert!(ReferenceEntry::new("ACG", "A1", 2).windows(false).is_some());
    }

    #[test]
    fn test_label_count() {
        let set = ReferenceSet::from_pairs(
            "test",
            [("AAAA", "W1"), ("CCCC", "W1"), ("GGGG", "W2")],
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.label_count(), 2);
        assert_eq!(set.entries[2].row, 4);
    }
}
