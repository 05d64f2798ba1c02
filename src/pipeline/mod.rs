//! End-to-end analysis of one sequencing run.
//!
//! 1. Load the plate map and amplicon map
//! 2. Build the three channel dictionaries in parallel
//! 3. Read the three FASTQ files, each cut to its dictionary's key width
//! 4. Match every read and count (index 1, index 2, amplicon) combinations
//! 5. Write `results.csv`, plus the unmatched reports in debug mode
//!
//! Index 1 is always read on the reverse strand. Index 2 follows the
//! instrument chemistry unless an orientation is given explicitly.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::core::reference::ReferenceSet;
use crate::core::types::{Channel, MatchField, Orientation};
use crate::dictionary::builder::{BuildConfig, DictionaryBuilder, DictionaryError};
use crate::dictionary::store::Dictionary;
use crate::matching::{
    aggregate, top_unmatched, AggregateError, CountTable, MatchOutcome, SequenceMatcher, UnmatchedCount,
    TOP_UNMATCHED,
};
use crate::parsing::fastq::read_sequences;
use crate::parsing::reference_map::{load_plate_map, load_reference_table, PlateMap};
use crate::parsing::run_parameters::read_orientation;

pub mod report;

/// Directory under the run directory holding the demultiplexer output
pub const FASTQ_SUBDIR: &str = "out";

/// Options for analysing one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Run directory containing `RunParameters.xml` and `out/*.fastq.gz`
    pub run_dir: PathBuf,

    /// `index,index2,target` table of the plate
    pub plate_map: PathBuf,

    /// `sequence,target` table of the amplicons
    pub amplicon_map: PathBuf,

    /// Index 2 orientation; read from `RunParameters.xml` when unset
    pub orientation: Option<Orientation>,

    /// Substitution and indel settings shared by all three dictionaries
    pub build: BuildConfig,

    /// Also write the most frequent unmatched reads per channel
    pub debug: bool,

    /// Where reports are written; defaults to the run directory
    pub output_dir: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn new(run_dir: impl Into<PathBuf>, plate_map: impl Into<PathBuf>, amplicon_map: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
            plate_map: plate_map.into(),
            amplicon_map: amplicon_map.into(),
            orientation: None,
            build: BuildConfig::default(),
            debug: false,
            output_dir: None,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.run_dir)
    }

    #[must_use]
    pub fn fastq_path(&self, channel: Channel) -> PathBuf {
        self.run_dir.join(FASTQ_SUBDIR).join(channel.fastq_name())
    }
}

/// The immutable dictionaries of one run
#[derive(Debug, Clone)]
pub struct RunDictionaries {
    pub index1: Dictionary,
    pub index2: Dictionary,
    pub amplicon: Dictionary,
}

impl RunDictionaries {
    /// Build all three dictionaries on the rayon pool.
    ///
    /// # Errors
    ///
    /// Returns the first `DictionaryError` of the three builds.
    pub fn build(
        plate: &PlateMap,
        amplicons: &ReferenceSet,
        base: &BuildConfig,
        index2_orientation: Orientation,
    ) -> Result<Self, DictionaryError> {
        let index1_builder = DictionaryBuilder::new(base.clone().with_orientation(Orientation::ReverseComplement));
        let index2_builder = DictionaryBuilder::new(base.clone().with_orientation(index2_orientation));
        let amplicon_builder = DictionaryBuilder::new(base.clone().with_orientation(Orientation::Forward));

        let (index1, (index2, amplicon)) = rayon::join(
            || index1_builder.build(&plate.index1),
            || {
                rayon::join(
                    || index2_builder.build(&plate.index2),
                    || amplicon_builder.build(amplicons),
                )
            },
        );

        Ok(Self {
            index1: index1?,
            index2: index2?,
            amplicon: amplicon?,
        })
    }

    #[must_use]
    pub fn get(&self, channel: Channel) -> &Dictionary {
        match channel {
            Channel::Index1 => &self.index1,
            Channel::Index2 => &self.index2,
            Channel::Amplicon => &self.amplicon,
        }
    }

    /// Barcodes report the canonical core, amplicons their name
    #[must_use]
    pub fn match_field(channel: Channel) -> MatchField {
        match channel {
            Channel::Index1 | Channel::Index2 => MatchField::OriginCore,
            Channel::Amplicon => MatchField::Label,
        }
    }
}

/// Observed reads of the three channels, read-aligned
#[derive(Debug, Clone, Default)]
pub struct RunReads {
    pub index1: Vec<String>,
    pub index2: Vec<String>,
    pub amplicon: Vec<String>,
}

impl RunReads {
    #[must_use]
    pub fn get(&self, channel: Channel) -> &[String] {
        match channel {
            Channel::Index1 => &self.index1,
            Channel::Index2 => &self.index2,
            Channel::Amplicon => &self.amplicon,
        }
    }

    /// Read the three FASTQ files of a run, cutting each read to its dictionary's key width
    ///
    /// # Errors
    ///
    /// Returns an error naming the file that could not be read.
    pub fn load(config: &AnalysisConfig, dictionaries: &RunDictionaries) -> anyhow::Result<Self> {
        let load = |channel: Channel| -> anyhow::Result<Vec<String>> {
            let path = config.fastq_path(channel);
            let width = dictionaries.get(channel).key_width();
            let reads = read_sequences(&path, Some(width))
                .with_context(|| format!("Failed to read {}", path.display()))?;
            debug!("{}: {} reads from {}", channel, reads.len(), path.display());
            Ok(reads)
        };

        let (index1, (index2, amplicon)) = rayon::join(
            || load(Channel::Index1),
            || rayon::join(|| load(Channel::Index2), || load(Channel::Amplicon)),
        );

        Ok(Self {
            index1: index1?,
            index2: index2?,
            amplicon: amplicon?,
        })
    }
}

/// Counts of one run, plus unmatched diagnostics when requested
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub counts: CountTable,

    /// Most frequent unmatched reads per channel (debug mode only)
    pub unmatched: Option<BTreeMap<Channel, Vec<UnmatchedCount>>>,

    pub index2_orientation: Orientation,
}

impl AnalysisResult {
    #[must_use]
    pub fn total_reads(&self) -> u64 {
        self.counts.total()
    }
}

/// Match and count the reads of a run.
///
/// Performs no I/O.
///
/// # Errors
///
/// Returns `AggregateError::MisalignedChannels` if the channels hold different read counts.
pub fn analyze(
    reads: &RunReads,
    dictionaries: &RunDictionaries,
    index2_orientation: Orientation,
    debug_reports: bool,
) -> Result<AnalysisResult, AggregateError> {
    let start = Instant::now();
    let outcomes: BTreeMap<Channel, Vec<MatchOutcome>> = Channel::ALL
        .iter()
        .map(|&channel| {
            let matcher = SequenceMatcher::new(dictionaries.get(channel), RunDictionaries::match_field(channel));
            (channel, matcher.par_match_reads(reads.get(channel)))
        })
        .collect();
    info!("Matched reads in {:.2?}", start.elapsed());

    let start = Instant::now();
    let counts = aggregate(
        &outcomes[&Channel::Index1],
        &outcomes[&Channel::Index2],
        &outcomes[&Channel::Amplicon],
    )?;
    info!(
        "Counted {} reads into {} combinations in {:.2?}",
        counts.total(),
        counts.len(),
        start.elapsed()
    );

    let unmatched = if debug_reports {
        let mut report = BTreeMap::new();
        for channel in Channel::ALL {
            let top = top_unmatched(channel, reads.get(channel), &outcomes[&channel], TOP_UNMATCHED)?;
            let missed = outcomes[&channel].iter().filter(|o| !o.is_matched()).count();
            debug!("{}: {} unmatched reads", channel, missed);
            report.insert(channel, top);
        }
        Some(report)
    } else {
        None
    };

    Ok(AnalysisResult {
        counts,
        unmatched,
        index2_orientation,
    })
}

/// Analyse a run directory and write its reports.
///
/// # Errors
///
/// Returns an error if a table, `RunParameters.xml` or a FASTQ file cannot be
/// read, if a dictionary cannot be built, or if a report cannot be written.
pub fn run_analysis(config: &AnalysisConfig) -> anyhow::Result<(AnalysisResult, Vec<PathBuf>)> {
    info!("Analysing run {}", config.run_dir.display());

    let plate = load_plate_map(&config.plate_map)
        .with_context(|| format!("Failed to load plate map {}", config.plate_map.display()))?;
    let amplicons = load_reference_table(&config.amplicon_map)
        .with_context(|| format!("Failed to load amplicon map {}", config.amplicon_map.display()))?;

    let orientation = match config.orientation {
        Some(orientation) => orientation,
        None => read_orientation(&config.run_dir)
            .with_context(|| format!("Failed to read run parameters in {}", config.run_dir.display()))?,
    };
    info!("Index 2 orientation: {:?}", orientation);

    let start = Instant::now();
    let dictionaries = RunDictionaries::build(&plate, &amplicons, &config.build, orientation)?;
    info!("Built dictionaries in {:.2?}", start.elapsed());

    let start = Instant::now();
    let reads = RunReads::load(config, &dictionaries)?;
    info!("Read {} reads in {:.2?}", reads.amplicon.len(), start.elapsed());

    let result = analyze(&reads, &dictionaries, orientation, config.debug)?;

    let written = report::write_reports(config.output_dir(), &result)?;
    info!(
        "Finished: {} of {} reads fully matched",
        result.counts.fully_matched(),
        result.total_reads()
    );

    Ok((result, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::reference_map::parse_plate_map;

    fn plate() -> PlateMap {
        let csv = "index,index2,target\nGAACCTC,GTTGGAC,A1\nGTTGGAC,GAACCTC,A2\n";
        parse_plate_map(csv.as_bytes(), "plate.csv").unwrap()
    }

    fn amplicons() -> ReferenceSet {
        ReferenceSet::from_pairs("amps.csv", [("GACGTACGC", "S2"), ("GTTTGGGAC", "RPP30")])
    }

    #[test]
    fn test_build_orients_each_channel() {
        let dicts = RunDictionaries::build(&plate(), &amplicons(), &BuildConfig::default(), Orientation::Forward).unwrap();

        // Index 1 core of A1 is AACCT reverse-complemented
        assert_eq!(dicts.index1.get("AGGTT").unwrap().label, "A1");
        // Index 2 is forward under a Rapid chemistry
        assert_eq!(dicts.index2.get("AACCT").unwrap().label, "A2");
        assert_eq!(dicts.amplicon.get("ACGTACG").unwrap().label, "S2");
    }

    #[test]
    fn test_analyze_counts_every_read() {
        let dicts = RunDictionaries::build(&plate(), &amplicons(), &BuildConfig::default(), Orientation::Forward).unwrap();
        let reads = RunReads {
            index1: vec!["AGGTT".into(), "AGGTT".into(), "CCCCC".into()],
            index2: vec!["TTGGA".into(), "TTGGA".into(), "TTGGA".into()],
            amplicon: vec!["ACGTACG".into(), "ACGTACC".into(), "TTTGGGA".into()],
        };

        let result = analyze(&reads, &dicts, Orientation::Forward, true).unwrap();
        assert_eq!(result.total_reads(), 3);

        let rows = result.counts.rows();
        let first = &rows[0];
        assert_eq!(first.index1.as_str(), "AGGTT");
        assert_eq!(first.index2.as_str(), "TTGGA");
        assert_eq!(first.amplicon.as_str(), "S2");
        assert_eq!(first.count, 2);
        assert_eq!(rows.last().unwrap().index1, MatchOutcome::Unmatched);

        let unmatched = result.unmatched.unwrap();
        assert_eq!(unmatched[&Channel::Index1][0].sequence, "CCCCC");
        assert!(unmatched[&Channel::Amplicon].is_empty());
    }

    #[test]
    fn test_analyze_rejects_misaligned_reads() {
        let dicts = RunDictionaries::build(&plate(), &amplicons(), &BuildConfig::default(), Orientation::Forward).unwrap();
        let reads = RunReads {
            index1: vec!["AGGTT".into()],
            index2: vec![],
            amplicon: vec!["ACGTACG".into()],
        };
        assert!(matches!(
            analyze(&reads, &dicts, Orientation::Forward, false),
            Err(AggregateError::MisalignedChannels { .. })
        ));
    }

    #[test]
    fn test_output_dir_defaults_to_run_dir() {
        let mut config = AnalysisConfig::new("/runs/r1", "plate.csv", "amps.csv");
        assert_eq!(config.output_dir(), Path::new("/runs/r1"));
        assert_eq!(
            config.fastq_path(Channel::Index2),
            Path::new("/runs/r1/out/Undetermined_S0_I2_001.fastq.gz")
        );
        config.output_dir = Some(PathBuf::from("/tmp/out"));
        assert_eq!(config.output_dir(), Path::new("/tmp/out"));
    }
}
