use serde::{Deserialize, Serialize};

/// How a dictionary variant relates to the reference core it was generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The reference core itself
    ExactMatch,
    /// One or more base substitutions
    Mismatch,
    /// A single base missing from the read
    BaseDeletion,
    /// A single extra base in the read
    BaseInsertion,
    /// Two generation rules produced the same string
    Undetermined,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactMatch => write!(f, "exact match"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::BaseDeletion => write!(f, "base deletion"),
            Self::BaseInsertion => write!(f, "base insertion"),
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Strand orientation of a barcode read relative to its reference table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Reads match the reference sequence as written
    #[default]
    Forward,
    /// Reads match the reverse complement of the reference sequence
    ReverseComplement,
}

impl Orientation {
    #[must_use]
    pub fn is_reverse_complement(self) -> bool {
        matches!(self, Self::ReverseComplement)
    }

    /// Derive the index-2 orientation from the instrument chemistry string.
    ///
    /// The chemistry is a space separated description such as `"Amplicon Rapid"`;
    /// only the `Rapid` kits read index 2 on the forward strand.
    #[must_use]
    pub fn from_chemistry(chemistry: &str) -> Self {
        match chemistry.split_whitespace().nth(1) {
            Some("Rapid") => Self::Forward,
            _ => Self::ReverseComplement,
        }
    }
}

/// The three read channels of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Index1,
    Index2,
    Amplicon,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Index1, Channel::Index2, Channel::Amplicon];

    /// Short name used in file names and report headers
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Index1 => "i1",
            Self::Index2 => "i2",
            Self::Amplicon => "amps",
        }
    }

    /// Name of the read file produced by the instrument for this channel
    #[must_use]
    pub fn fastq_name(self) -> &'static str {
        match self {
            Self::Index1 => "Undetermined_S0_I1_001.fastq.gz",
            Self::Index2 => "Undetermined_S0_I2_001.fastq.gz",
            Self::Amplicon => "Undetermined_S0_R1_001.fastq.gz",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index1 => write!(f, "index 1"),
            Self::Index2 => write!(f, "index 2"),
            Self::Amplicon => write!(f, "amplicon"),
        }
    }
}

/// Which field of a matched variant record is reported per read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    /// The canonical core sequence of the reference entry
    OriginCore,
    /// The reference label (well or amplicon name)
    Label,
}
