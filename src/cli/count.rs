use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{BuildOptions, OutputFormat};
use crate::core::types::Orientation;
use crate::pipeline::{run_analysis, AnalysisConfig};

#[derive(Args)]
pub struct CountArgs {
    /// Run directory containing RunParameters.xml and out/Undetermined_S0_*_001.fastq.gz
    #[arg(required = true)]
    pub run_dir: PathBuf,

    /// Plate map with index, index2 and target columns
    #[arg(long)]
    pub plate_map: PathBuf,

    /// Amplicon map with sequence and target columns
    #[arg(long)]
    pub amplicon_map: PathBuf,

    /// Index 2 orientation (read from RunParameters.xml by default)
    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,

    /// Also write the five most frequent unmatched reads per channel
    #[arg(long)]
    pub debug: bool,

    /// Directory for the reports (defaults to the run directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub build: BuildOptions,
}

/// Execute the count command
///
/// # Errors
///
/// Returns an error if the run cannot be analysed or its reports cannot be written.
pub fn run(args: CountArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the worker pool")?;
    }

    let config = AnalysisConfig {
        run_dir: args.run_dir,
        plate_map: args.plate_map,
        amplicon_map: args.amplicon_map,
        orientation: args.orientation,
        build: args.build.to_config()?,
        debug: args.debug,
        output_dir: args.output_dir,
    };

    let (result, written) = run_analysis(&config)?;

    match format {
        OutputFormat::Text => {
            println!("Run:           {}", config.run_dir.display());
            println!("Index 2:       {:?}", result.index2_orientation);
            println!("Reads:         {}", result.total_reads());
            println!("Fully matched: {}", result.counts.fully_matched());
            println!("Combinations:  {}", result.counts.len());
            if verbose {
                if let Some(unmatched) = &result.unmatched {
                    for (channel, rows) in unmatched {
                        println!("\nTop unmatched ({channel}):");
                        for row in rows.iter().rev() {
                            println!("  {:<30} {:>10}", row.sequence, row.count);
                        }
                    }
                }
            }
            println!();
            for path in &written {
                println!("Wrote {}", path.display());
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "run_dir": config.run_dir.display().to_string(),
                "index2_orientation": result.index2_orientation,
                "total_reads": result.total_reads(),
                "fully_matched": result.counts.fully_matched(),
                "results": result.counts.rows(),
                "unmatched": result.unmatched,
                "files": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("index1\tindex2\tamplicon\tcount");
            for row in result.counts.rows() {
                println!("{}\t{}\t{}\t{}", row.index1, row.index2, row.amplicon, row.count);
            }
        }
    }

    Ok(())
}
