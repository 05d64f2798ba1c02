//! Dictionary construction from a reference table.
//!
//! Every reference entry contributes its exact core plus every variant a single
//! sequencing error could turn it into. Variants that two error models explain
//! equally well within one entry are collapsed into a single `Undetermined`
//! record. Across entries the dictionary keeps the record of the entry
//! processed last, unless [`CollisionPolicy::Strict`] is requested.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::reference::{ReferenceEntry, ReferenceSet};
use crate::core::sequence::{Alphabet, INSERTION_BASES, IUPAC_CORE_BASES, MIN_REFERENCE_LENGTH};
use crate::core::types::{Classification, Orientation};
use crate::dictionary::store::{Dictionary, VariantRecord};
use crate::dictionary::variants::{HammingBall, VariantError};

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("{table}: no reference entries")]
    EmptyReferenceSet { table: String },

    #[error("{table}, row {row}: empty sequence")]
    EmptySequence { table: String, row: usize },

    #[error("{table}, row {row}: sequence of length {length} is shorter than the minimum of {MIN_REFERENCE_LENGTH}")]
    SequenceTooShort {
        table: String,
        row: usize,
        length: usize,
    },

    #[error("{table}, row {row}: invalid base '{base}'")]
    InvalidBase { table: String, row: usize, base: char },

    #[error("{table}, row {row}: sequence length {found} differs from the first entry ({expected})")]
    InconsistentLength {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{table}: edit budget {budget} exceeds core length {core_length}")]
    EditBudgetTooLarge {
        table: String,
        budget: usize,
        core_length: usize,
    },

    #[error("{table}, row {row}: variant {variant} of '{incoming}' collides with '{existing}'")]
    CrossEntryCollision {
        table: String,
        row: usize,
        variant: String,
        existing: String,
        incoming: String,
    },

    #[error("Variant generation failed: {0}")]
    Variant(#[from] VariantError),
}

/// What to do when two reference entries generate the same variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The entry processed last owns the variant
    #[default]
    LastWins,
    /// Fail the build
    Strict,
}

/// Options for building one channel's dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Maximum number of substitutions (0 = exact matches only)
    pub edit_budget: usize,

    /// Also generate single-base deletion and insertion variants
    pub allow_indels: bool,

    /// Match reads against the reverse complement of each reference
    pub reverse_complement: bool,

    /// Symbols used for substitutions
    pub alphabet: Alphabet,

    pub collision_policy: CollisionPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            edit_budget: 1,
            allow_indels: true,
            reverse_complement: false,
            alphabet: Alphabet::default(),
            collision_policy: CollisionPolicy::LastWins,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.reverse_complement = orientation.is_reverse_complement();
        self
    }

    #[must_use]
    pub fn with_edit_budget(mut self, edit_budget: usize) -> Self {
        self.edit_budget = edit_budget;
        self
    }

    #[must_use]
    pub fn with_indels(mut self, allow_indels: bool) -> Self {
        self.allow_indels = allow_indels;
        self
    }

    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

/// Builds dictionaries from reference sets
pub struct DictionaryBuilder {
    config: BuildConfig,
}

impl DictionaryBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the dictionary for a reference set.
    ///
    /// All entries are validated before any variant is generated.
    ///
    /// # Errors
    ///
    /// Returns a `DictionaryError` naming the table and row of the first
    /// malformed entry, or of the first cross-entry collision under
    /// [`CollisionPolicy::Strict`].
    pub fn build(&self, references: &ReferenceSet) -> Result<Dictionary, DictionaryError> {
        let core_length = self.validate(references)?;
        let mut dictionary = Dictionary::new(core_length);

        for entry in &references.entries {
            for record in self.entry_variants(&references.source, entry)? {
                if self.config.collision_policy == CollisionPolicy::Strict {
                    if let Some(existing) = dictionary.get(&record.variant_sequence) {
                        return Err(DictionaryError::CrossEntryCollision {
                            table: references.source.clone(),
                            row: entry.row,
                            variant: record.variant_sequence.clone(),
                            existing: existing.label.clone(),
                            incoming: record.label.clone(),
                        });
                    }
                }
                dictionary.insert(record);
            }
        }
        dictionary.set_reference_count(references.len());

        let undetermined = dictionary
            .records()
            .filter(|r| r.classification == Classification::Undetermined)
            .count();
        info!(
            "Built dictionary for {}: {} entries, {} keys ({} undetermined), key width {}",
            references.source,
            references.len(),
            dictionary.len(),
            undetermined,
            core_length
        );

        Ok(dictionary)
    }

    /// Check every entry and return the shared core length
    fn validate(&self, references: &ReferenceSet) -> Result<usize, DictionaryError> {
        let table = || references.source.clone();

        let Some(first) = references.entries.first() else {
            return Err(DictionaryError::EmptyReferenceSet { table: table() });
        };
        let expected = first.raw_sequence.len();

        for entry in &references.entries {
            let length = entry.raw_sequence.len();
            if length == 0 {
                return Err(DictionaryError::EmptySequence {
                    table: table(),
                    row: entry.row,
                });
            }
            if let Some(base) = entry
                .raw_sequence
                .chars()
                .find(|&c| !IUPAC_CORE_BASES.contains(&c) && !self.config.alphabet.contains(c))
            {
                return Err(DictionaryError::InvalidBase {
                    table: table(),
                    row: entry.row,
                    base,
                });
            }
            if length < MIN_REFERENCE_LENGTH {
                return Err(DictionaryError::SequenceTooShort {
                    table: table(),
                    row: entry.row,
                    length,
                });
            }
            if length != expected {
                return Err(DictionaryError::InconsistentLength {
                    table: table(),
                    row: entry.row,
                    expected,
                    found: length,
                });
            }
        }

        let core_length = expected - 2;
        if self.config.edit_budget > core_length {
            return Err(DictionaryError::EditBudgetTooLarge {
                table: table(),
                budget: self.config.edit_budget,
                core_length,
            });
        }

        Ok(core_length)
    }

    /// All variants of a single entry after collision resolution, in generation order
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::SequenceTooShort` naming `table` if the entry
    /// has no core, or `DictionaryError::Variant` if the edit budget exceeds the
    /// core length.
    pub fn entry_variants(
        &self,
        table: &str,
        entry: &ReferenceEntry,
    ) -> Result<Vec<VariantRecord>, DictionaryError> {
        let Some(window) = entry.windows(self.config.reverse_complement) else {
            return Err(DictionaryError::SequenceTooShort {
                table: table.to_string(),
                row: entry.row,
                length: entry.raw_sequence.len(),
            });
        };
        let core = window.core;

        let mut candidates = vec![(core.clone(), Classification::ExactMatch)];

        if self.config.edit_budget > 0 {
            let ball = HammingBall::new(&core, self.config.edit_budget, &self.config.alphabet)?;
            // The ball starts with the core itself, which is already seeded
            candidates.extend(ball.iter().skip(1).map(|v| (v, Classification::Mismatch)));
        }

        if self.config.allow_indels {
            candidates.extend(
                deletion_variants(&window.with_flank)
                    .into_iter()
                    .filter(|v| *v != core)
                    .map(|v| (v, Classification::BaseDeletion)),
            );
            candidates.extend(
                insertion_variants(&core)
                    .into_iter()
                    .filter(|v| *v != core)
                    .map(|v| (v, Classification::BaseInsertion)),
            );
        }

        let generated = candidates.len();
        let resolved = resolve_collisions(candidates);
        debug!(
            "Row {} ({}): {} candidates, {} after collision resolution",
            entry.row,
            entry.label,
            generated,
            resolved.len()
        );

        Ok(resolved
            .into_iter()
            .map(|(variant_sequence, classification)| VariantRecord {
                variant_sequence,
                origin_core: core.clone(),
                label: entry.label.clone(),
                classification,
            })
            .collect())
    }
}

/// Delete each core position from `core + trailing flank`.
///
/// A read missing base `j` shifts the following bases left and pulls the flank
/// base into the last position, so every variant keeps the core width.
#[must_use]
pub fn deletion_variants(with_flank: &str) -> Vec<String> {
    let bases: Vec<char> = with_flank.chars().collect();
    let core_length = bases.len().saturating_sub(1);

    (0..core_length)
        .map(|j| {
            bases
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != j)
                .map(|(_, &c)| c)
                .collect()
        })
        .collect()
}

/// Insert each of `A`, `T`, `G`, `C` at every point of the core, then drop the
/// last base to restore the core width.
#[must_use]
pub fn insertion_variants(core: &str) -> Vec<String> {
    let bases: Vec<char> = core.chars().collect();
    let width = bases.len();

    let mut variants = Vec::with_capacity(INSERTION_BASES.len() * (width + 1));
    for &base in INSERTION_BASES {
        for j in 0..=width {
            let mut x = bases.clone();
            x.insert(j, base);
            x.truncate(width);
            variants.push(x.into_iter().collect());
        }
    }
    variants
}

/// Collapse duplicate variant strings within one entry.
///
/// For every string produced more than once the first occurrence is kept and
/// reclassified as `Undetermined`; later occurrences are dropped. Order of the
/// survivors is preserved.
#[must_use]
pub fn resolve_collisions(candidates: Vec<(String, Classification)>) -> Vec<(String, Classification)> {
    let mut keep = vec![true; candidates.len()];
    let mut collided = vec![false; candidates.len()];

    {
        let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(candidates.len());
        for (i, (seq, _)) in candidates.iter().enumerate() {
            match first_seen.entry(seq.as_str()) {
                Entry::Occupied(first) => {
                    collided[*first.get()] = true;
                    keep[i] = false;
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }
    }

    candidates
        .into_iter()
        .enumerate()
        .filter(|&(i, _)| keep[i])
        .map(|(i, (seq, classification))| {
            if collided[i] {
                (seq, Classification::Undetermined)
            } else {
                (seq, classification)
            }
        })
        .collect()
}
