use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::{BuildOptions, OutputFormat};
use crate::core::reference::ReferenceSet;
use crate::core::types::{Channel, Classification, Orientation};
use crate::dictionary::builder::{BuildConfig, DictionaryBuilder};
use crate::dictionary::store::Dictionary;
use crate::parsing::reference_map::{load_plate_map, load_reference_table};

#[derive(Args)]
pub struct BuildArgs {
    /// Reference table: a plate map for index channels, an amplicon map otherwise
    pub table: PathBuf,

    /// Which channel the table describes
    #[arg(short, long, value_enum, default_value = "amplicon")]
    pub channel: Channel,

    /// Index 2 orientation (index 1 is always reverse-complemented, amplicons never)
    #[arg(long, value_enum, default_value = "reverse-complement")]
    pub orientation: Orientation,

    /// Export the dictionary (.json for JSON, anything else for binary)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List every key, not just the summary
    #[arg(long)]
    pub keys: bool,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Load the reference entries of one channel from its table
///
/// # Errors
///
/// Returns an error naming the table if it cannot be parsed.
pub fn load_channel_references(table: &Path, channel: Channel) -> anyhow::Result<ReferenceSet> {
    let references = match channel {
        Channel::Amplicon => load_reference_table(table)?,
        Channel::Index1 => load_plate_map(table)?.index1,
        Channel::Index2 => load_plate_map(table)?.index2,
    };
    Ok(references)
}

/// Orient a build for a channel the way a run analysis would
#[must_use]
pub fn channel_config(base: BuildConfig, channel: Channel, index2_orientation: Orientation) -> BuildConfig {
    let orientation = match channel {
        Channel::Index1 => Orientation::ReverseComplement,
        Channel::Index2 => index2_orientation,
        Channel::Amplicon => Orientation::Forward,
    };
    base.with_orientation(orientation)
}

/// Build a channel dictionary from CLI arguments
///
/// # Errors
///
/// Returns an error if the table cannot be loaded or the dictionary cannot be built.
pub fn build_dictionary(
    table: &Path,
    channel: Channel,
    orientation: Orientation,
    options: &BuildOptions,
) -> anyhow::Result<Dictionary> {
    let references = load_channel_references(table, channel)
        .with_context(|| format!("Failed to load {}", table.display()))?;
    let config = channel_config(options.to_config()?, channel, orientation);
    Ok(DictionaryBuilder::new(config).build(&references)?)
}

/// Execute the build command
///
/// # Errors
///
/// Returns an error if the dictionary cannot be built or written.
pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dictionary = build_dictionary(&args.table, args.channel, args.orientation, &args.build)?;

    if let Some(output) = &args.output {
        dictionary
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        if verbose {
            eprintln!("Wrote dictionary to {}", output.display());
        }
    }

    let counts = dictionary.classification_counts();
    let classes = [
        Classification::ExactMatch,
        Classification::Mismatch,
        Classification::BaseDeletion,
        Classification::BaseInsertion,
        Classification::Undetermined,
    ];

    match format {
        OutputFormat::Text => {
            println!("Dictionary: {} ({})\n", args.table.display(), args.channel);
            println!("References: {}", dictionary.reference_count());
            println!("Key width:  {}", dictionary.key_width());
            println!("Keys:       {}", dictionary.len());
            for class in classes {
                println!("  {:<16} {:>8}", class.to_string(), counts.get(&class).copied().unwrap_or(0));
            }
            if args.keys {
                println!("\n{:<20} {:<20} {:<12} Classification", "Key", "Origin", "Label");
                println!("{}", "-".repeat(70));
                for record in dictionary.sorted_records() {
                    println!(
                        "{:<20} {:<20} {:<12} {}",
                        record.variant_sequence, record.origin_core, record.label, record.classification
                    );
                }
            }
        }
        OutputFormat::Json => {
            let mut json = serde_json::json!({
                "table": args.table.display().to_string(),
                "channel": args.channel,
                "references": dictionary.reference_count(),
                "key_width": dictionary.key_width(),
                "keys": dictionary.len(),
                "classifications": classes
                    .iter()
                    .map(|c| (c.to_string(), counts.get(c).copied().unwrap_or(0)))
                    .collect::<std::collections::BTreeMap<_, _>>(),
            });
            if args.keys {
                json["records"] = serde_json::json!(dictionary.sorted_records());
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("variant_sequence\torigin_core\tlabel\tclassification");
            for record in dictionary.sorted_records() {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.variant_sequence, record.origin_core, record.label, record.classification
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_orientation() {
        let base = BuildConfig::default();
        assert!(channel_config(base.clone(), Channel::Index1, Orientation::Forward).reverse_complement);
        assert!(!channel_config(base.clone(), Channel::Index2, Orientation::Forward).reverse_complement);
        assert!(channel_config(base.clone(), Channel::Index2, Orientation::ReverseComplement).reverse_complement);
        assert!(!channel_config(base, Channel::Amplicon, Orientation::ReverseComplement).reverse_complement);
    }

    #[test]
    fn test_load_channel_references() {
        let dir = tempfile::tempdir().unwrap();
        let plate = dir.path().join("plate.csv");
        std::fs::write(&plate, "index,index2,target\nGAACCTC,GTTGGAC,A1\n").unwrap();

        let index2 = load_channel_references(&plate, Channel::Index2).unwrap();
        assert_eq!(index2.entries[0].raw_sequence, "GTTGGAC");
        assert!(load_channel_references(&plate, Channel::Amplicon).is_err());
    }
}
