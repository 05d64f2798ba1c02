//! Command-line interface for amplicount.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **count**: Count barcode and amplicon combinations of a run directory
//! - **build**: Build one channel's dictionary and summarise or export it
//! - **lookup**: Classify individual sequences against a dictionary
//! - **serve**: Start the HTTP analysis service
//!
//! ## Usage
//!
//! ```text
//! # Analyse a run, reading the index 2 orientation from RunParameters.xml
//! amplicount count /runs/210310_swab --plate-map 384_plate_map.csv --amplicon-map amplicon_map.csv
//!
//! # Also report the most frequent unmatched reads
//! amplicount count /runs/210310_swab --plate-map plate.csv --amplicon-map amps.csv --debug
//!
//! # Export an amplicon dictionary
//! amplicount build amplicon_map.csv --channel amplicon --output amplicons.bin
//!
//! # Look up reads against it
//! amplicount lookup ACGTACG TTTGGGA --dictionary amplicons.bin --format json
//!
//! # Start the service
//! amplicount serve --runs-root /runs --plate-map plate.csv --amplicon-map amps.csv
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::sequence::{Alphabet, DEFAULT_ALPHABET};
use crate::dictionary::builder::{BuildConfig, CollisionPolicy};

pub mod build;
pub mod count;
pub mod lookup;

#[derive(Parser)]
#[command(name = "amplicount")]
#[command(version)]
#[command(about = "Error-tolerant barcode and amplicon counting for amplicon sequencing runs")]
#[command(
    long_about = "amplicount assigns every read of a multiplexed amplicon sequencing run to a well and an amplicon.\n\nEach barcode and amplicon table is expanded into a dictionary of every sequence a single sequencing error could produce, so reads with substitutions, deletions or insertions are still identified. Counts are reported per (index 1, index 2, amplicon) combination."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count barcode and amplicon combinations of a run
    Count(count::CountArgs),

    /// Build a dictionary from a reference table
    Build(build::BuildArgs),

    /// Classify sequences against a dictionary
    Lookup(lookup::LookupArgs),

    /// Start the HTTP analysis service
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Directory holding one sub-directory per run
    #[arg(long)]
    pub runs_root: PathBuf,

    /// Plate map with index, index2 and target columns
    #[arg(long)]
    pub plate_map: PathBuf,

    /// Default amplicon map with sequence and target columns
    #[arg(long)]
    pub amplicon_map: PathBuf,

    /// Amplicon map for a season, as NAME=PATH (repeatable)
    #[arg(long = "season", value_parser = parse_season)]
    pub seasons: Vec<(String, PathBuf)>,

    /// Bearer token required on POST requests (falls back to AMPLICOUNT_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Write unmatched reports for every run
    #[arg(long)]
    pub debug: bool,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Dictionary options shared by every command that builds one
#[derive(Args, Clone, Debug)]
pub struct BuildOptions {
    /// Maximum number of substitutions per read (0 = exact matches only)
    #[arg(long, default_value = "1")]
    pub edit_budget: usize,

    /// Do not generate single-base deletion and insertion variants
    #[arg(long)]
    pub no_indels: bool,

    /// Symbols used for substitutions
    #[arg(long, default_value = DEFAULT_ALPHABET)]
    pub alphabet: String,

    /// What to do when two references generate the same variant
    #[arg(long, value_enum, default_value = "last-wins")]
    pub collision_policy: CollisionPolicy,
}

impl BuildOptions {
    /// # Errors
    ///
    /// Returns an error if the alphabet is empty or repeats a symbol.
    pub fn to_config(&self) -> anyhow::Result<BuildConfig> {
        let alphabet = Alphabet::try_from(self.alphabet.clone())?;

        Ok(BuildConfig {
            edit_budget: self.edit_budget,
            allow_indels: !self.no_indels,
            reverse_complement: false,
            alphabet,
            collision_policy: self.collision_policy,
        })
    }
}

fn parse_season(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{value}'")),
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
