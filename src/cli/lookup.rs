use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::cli::build::build_dictionary;
use crate::cli::{BuildOptions, OutputFormat};
use crate::core::types::{Channel, Classification, MatchField, Orientation};
use crate::dictionary::store::Dictionary;
use crate::matching::engine::UNMATCHED;
use crate::matching::SequenceMatcher;

#[derive(Args)]
pub struct LookupArgs {
    /// Sequences to classify
    #[arg(required = true)]
    pub sequences: Vec<String>,

    /// Reference table to build the dictionary from
    #[arg(long, conflicts_with = "dictionary", required_unless_present = "dictionary")]
    pub table: Option<PathBuf>,

    /// Previously exported dictionary
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// Which channel the table describes
    #[arg(short, long, value_enum, default_value = "amplicon")]
    pub channel: Channel,

    /// Index 2 orientation when building from a plate map
    #[arg(long, value_enum, default_value = "reverse-complement")]
    pub orientation: Orientation,

    #[command(flatten)]
    pub build: BuildOptions,
}

#[derive(Debug, Serialize)]
struct LookupResult<'a> {
    sequence: &'a str,
    label: Option<&'a str>,
    origin_core: Option<&'a str>,
    classification: Option<Classification>,
}

/// Execute the lookup command
///
/// # Errors
///
/// Returns an error if the dictionary cannot be loaded or built.
pub fn run(args: LookupArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dictionary = match (&args.dictionary, &args.table) {
        (Some(path), _) => {
            Dictionary::load_from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        (None, Some(table)) => build_dictionary(table, args.channel, args.orientation, &args.build)?,
        (None, None) => anyhow::bail!("Either --table or --dictionary is required"),
    };

    if verbose {
        eprintln!(
            "Dictionary with {} keys of width {}",
            dictionary.len(),
            dictionary.key_width()
        );
    }

    let sequences: Vec<String> = args.sequences.iter().map(|s| s.trim().to_ascii_uppercase()).collect();
    let matcher = SequenceMatcher::new(&dictionary, MatchField::Label);
    let results: Vec<LookupResult> = sequences
        .iter()
        .map(|sequence| {
            let record = matcher.classify(sequence);
            LookupResult {
                sequence,
                label: record.map(|r| r.label.as_str()),
                origin_core: record.map(|r| r.origin_core.as_str()),
                classification: record.map(|r| r.classification),
            }
        })
        .collect();

    match format {
        OutputFormat::Text => {
            for r in &results {
                match (r.label, r.origin_core, r.classification) {
                    (Some(label), Some(core), Some(class)) => {
                        println!("{}\t{} ({}, {})", r.sequence, label, core, class);
                    }
                    _ => println!("{}\t{}", r.sequence, UNMATCHED),
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Tsv => {
            println!("sequence\tlabel\torigin_core\tclassification");
            for r in &results {
                println!(
                    "{}\t{}\t{}\t{}",
                    r.sequence,
                    r.label.unwrap_or(UNMATCHED),
                    r.origin_core.unwrap_or(UNMATCHED),
                    r.classification.map_or_else(|| UNMATCHED.to_string(), |c| c.to_string())
                );
            }
        }
    }

    Ok(())
}
