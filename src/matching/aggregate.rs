//! Aggregation of per-read outcomes into count tables.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::core::types::Channel;
use crate::matching::engine::MatchOutcome;

/// Number of unmatched sequences reported per channel in diagnostic mode
pub const TOP_UNMATCHED: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Channels are not read-aligned: {index1} index 1, {index2} index 2 and {amplicon} amplicon outcomes")]
    MisalignedChannels {
        index1: usize,
        index2: usize,
        amplicon: usize,
    },

    #[error("{channel}: {reads} reads but {outcomes} outcomes")]
    LengthMismatch {
        channel: Channel,
        reads: usize,
        outcomes: usize,
    },
}

/// One row key of the count table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CountKey {
    pub index1: MatchOutcome,
    pub index2: MatchOutcome,
    pub amplicon: MatchOutcome,
}

/// One row of the count table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub index1: MatchOutcome,
    pub index2: MatchOutcome,
    pub amplicon: MatchOutcome,
    pub count: u64,
}

/// Read counts per (index 1, index 2, amplicon) combination.
///
/// Rows iterate in key order, with unmatched components after matched ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: BTreeMap<CountKey, u64>,
}

impl CountTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: CountKey, count: u64) {
        *self.counts.entry(key).or_default() += count;
    }

    /// Key-wise sum of two tables
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (key, count) in other.counts {
            self.add(key, count);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &CountKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Total number of reads counted
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Reads whose three channels all matched
    #[must_use]
    pub fn fully_matched(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(k, _)| k.index1.is_matched() && k.index2.is_matched() && k.amplicon.is_matched())
            .map(|(_, c)| c)
            .sum()
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CountKey, u64)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    #[must_use]
    pub fn rows(&self) -> Vec<CountRow> {
        self.counts
            .iter()
            .map(|(k, &count)| CountRow {
                index1: k.index1.clone(),
                index2: k.index2.clone(),
                amplicon: k.amplicon.clone(),
                count,
            })
            .collect()
    }
}

/// Count read-aligned outcomes of the three channels.
///
/// Read `i` contributes one count to the key formed by the `i`-th outcome of
/// each channel. Shards are counted on the rayon pool and merged.
///
/// # Errors
///
/// Returns `AggregateError::MisalignedChannels` if the channels differ in length.
pub fn aggregate(
    index1: &[MatchOutcome],
    index2: &[MatchOutcome],
    amplicon: &[MatchOutcome],
) -> Result<CountTable, AggregateError> {
    if index1.len() != index2.len() || index1.len() != amplicon.len() {
        return Err(AggregateError::MisalignedChannels {
            index1: index1.len(),
            index2: index2.len(),
            amplicon: amplicon.len(),
        });
    }

    Ok((0..index1.len())
        .into_par_iter()
        .fold(CountTable::new, |mut table, i| {
            table.add(
                CountKey {
                    index1: index1[i].clone(),
                    index2: index2[i].clone(),
                    amplicon: amplicon[i].clone(),
                },
                1,
            );
            table
        })
        .reduce(CountTable::new, CountTable::merge))
}

/// Frequency of one unmatched read sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedCount {
    pub sequence: String,
    pub count: u64,
}

/// The most frequent unmatched reads of one channel, least frequent first.
///
/// Ties are broken by sequence so the report is stable.
///
/// # Errors
///
/// Returns `AggregateError::LengthMismatch` if `reads` and `outcomes` differ in length.
pub fn top_unmatched<S: AsRef<str>>(
    channel: Channel,
    reads: &[S],
    outcomes: &[MatchOutcome],
    limit: usize,
) -> Result<Vec<UnmatchedCount>, AggregateError> {
    if reads.len() != outcomes.len() {
        return Err(AggregateError::LengthMismatch {
            channel,
            reads: reads.len(),
            outcomes: outcomes.len(),
        });
    }

    let mut frequencies: HashMap<&str, u64> = HashMap::new();
    for (read, outcome) in reads.iter().zip(outcomes) {
        if !outcome.is_matched() {
            *frequencies.entry(read.as_ref()).or_default() += 1;
        }
    }

    let mut sorted: Vec<(&str, u64)> = frequencies.into_iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let skip = sorted.len().saturating_sub(limit);
    Ok(sorted
        .into_iter()
        .skip(skip)
        .map(|(sequence, count)| UnmatchedCount {
            sequence: sequence.to_string(),
            count,
        })
        .collect())
}
