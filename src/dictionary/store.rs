use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::types::{Classification, MatchField};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read dictionary: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse dictionary: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to decode dictionary: {0}")]
    BinaryError(#[from] bincode::Error),

    #[error("Dictionary version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: String, found: String },
}

/// Dictionary file format version
pub const DICTIONARY_VERSION: &str = "1.0.0";

/// One dictionary value: the reference a variant string was generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// The observable sequence (the dictionary key)
    pub variant_sequence: String,

    /// Core sequence of the reference entry that generated this variant
    pub origin_core: String,

    /// Label of the reference entry that generated this variant
    pub label: String,

    pub classification: Classification,
}

impl VariantRecord {
    /// The field reported for a read matching this record
    #[must_use]
    pub fn field(&self, field: MatchField) -> &str {
        match field {
            MatchField::OriginCore => &self.origin_core,
            MatchField::Label => &self.label,
        }
    }
}

/// Lookup from observable sequence to the variant record that explains it.
///
/// Each key holds exactly one record. When two reference entries generate the
/// same key the entry inserted last owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Width of every key (the reference core length)
    key_width: usize,

    /// Number of reference entries the dictionary was built from
    reference_count: usize,

    records: HashMap<String, VariantRecord>,
}

/// Serializable dictionary file
#[derive(Debug, Serialize, Deserialize)]
struct DictionaryFile {
    version: String,
    created_at: String,
    dictionary: Dictionary,
}

impl Dictionary {
    #[must_use]
    pub fn new(key_width: usize) -> Self {
        Self {
            key_width,
            reference_count: 0,
            records: HashMap::new(),
        }
    }

    /// Insert a record under its variant sequence, returning the record it displaced
    pub fn insert(&mut self, record: VariantRecord) -> Option<VariantRecord> {
        self.records.insert(record.variant_sequence.clone(), record)
    }

    pub(crate) fn set_reference_count(&mut self, count: usize) {
        self.reference_count = count;
    }

    #[must_use]
    pub fn get(&self, sequence: &str) -> Option<&VariantRecord> {
        self.records.get(sequence)
    }

    #[must_use]
    pub fn contains(&self, sequence: &str) -> bool {
        self.records.contains_key(sequence)
    }

    #[must_use]
    pub fn key_width(&self) -> usize {
        self.key_width
    }

    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &VariantRecord> {
        self.records.values()
    }

    /// Records sorted by variant sequence, for stable output
    #[must_use]
    pub fn sorted_records(&self) -> Vec<&VariantRecord> {
        let mut records: Vec<&VariantRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.variant_sequence.cmp(&b.variant_sequence));
        records
    }

    /// Number of keys per classification
    #[must_use]
    pub fn classification_counts(&self) -> HashMap<Classification, usize> {
        let mut counts = HashMap::new();
        for record in self.records.values() {
            *counts.entry(record.classification).or_default() += 1;
        }
        counts
    }

    /// Load a dictionary written by [`Dictionary::save`].
    ///
    /// Files ending in `.json` are read as JSON, anything else as bincode.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path)?;
        let file: DictionaryFile = if is_json(path) {
            serde_json::from_slice(&bytes)?
        } else {
            bincode::deserialize(&bytes)?
        };

        if file.version != DICTIONARY_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: DICTIONARY_VERSION.to_string(),
                found: file.version,
            });
        }

        Ok(file.dictionary)
    }

    /// Write the dictionary, choosing JSON or bincode from the file extension
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = DictionaryFile {
            version: DICTIONARY_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            dictionary: self.clone(),
        };

        let bytes = if is_json(path) {
            serde_json::to_vec_pretty(&file)?
        } else {
            bincode::serialize(&file)?
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
