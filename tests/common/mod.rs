//! Scratch run directories shared by the integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PLATE_MAP: &str = "index,index2,target\nGAACCTC,GTTGGAC,A1\nGTTGGAC,GAACCTC,A2\n";
pub const AMPLICON_MAP: &str = "sequence,target\nGACGTACGC,S2\nGTTTGGGAC,RPP30\n";

/// Reads as (index 1, index 2, amplicon), longer than the keys they match
pub const READS: &[(&str, &str, &str)] = &[
    ("AGGTTCA", "TTGGAAT", "ACGTACGTTT"),
    ("AGGTTGG", "TTGGACC", "ACGTACCTTT"),
    ("TCCAAGT", "AACCTAA", "TTTGGGAGGG"),
    ("CCCCCCC", "AACCTAA", "TTTGGGAGGG"),
];

pub const EXPECTED_RESULTS: &str = "index1,index2,amplicon,count\n\
AGGTT,TTGGA,S2,2\n\
TCCAA,AACCT,RPP30,1\n\
NA,AACCT,RPP30,1\n";

pub fn run_parameters(chemistry: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<RunParameters>\n  <Chemistry>{chemistry}</Chemistry>\n</RunParameters>\n"
    )
}

fn write_fastq_gz(path: &Path, sequences: &[&str]) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    for (i, seq) in sequences.iter().enumerate() {
        writeln!(encoder, "@read{}\n{}\n+\n{}", i + 1, seq, "I".repeat(seq.len())).unwrap();
    }
    encoder.finish().unwrap();
}

/// Paths of a scratch run and its reference tables
pub struct Fixture {
    pub run_dir: PathBuf,
    pub plate_map: PathBuf,
    pub amplicon_map: PathBuf,
}

/// Write a Rapid-chemistry run named `run_id` under `root`, with tables beside it
pub fn write_run(root: &Path, run_id: &str) -> Fixture {
    let run_dir = root.join(run_id);
    let out = run_dir.join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(run_dir.join("RunParameters.xml"), run_parameters("Amplicon Rapid")).unwrap();

    let i1: Vec<&str> = READS.iter().map(|r| r.0).collect();
    let i2: Vec<&str> = READS.iter().map(|r| r.1).collect();
    let amps: Vec<&str> = READS.iter().map(|r| r.2).collect();
    write_fastq_gz(&out.join("Undetermined_S0_I1_001.fastq.gz"), &i1);
    write_fastq_gz(&out.join("Undetermined_S0_I2_001.fastq.gz"), &i2);
    write_fastq_gz(&out.join("Undetermined_S0_R1_001.fastq.gz"), &amps);

    let plate_map = root.join("plate.csv");
    let amplicon_map = root.join("amps.csv");
    std::fs::write(&plate_map, PLATE_MAP).unwrap();
    std::fs::write(&amplicon_map, AMPLICON_MAP).unwrap();

    Fixture {
        run_dir,
        plate_map,
        amplicon_map,
    }
}
