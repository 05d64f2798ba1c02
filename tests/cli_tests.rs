//! End-to-end tests of the amplicount binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn amplicount() -> Command {
    Command::cargo_bin("amplicount").unwrap()
}

#[test]
fn test_count_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");

    amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .assert()
        .success()
        .stdout(predicate::str::contains("Reads:         4"))
        .stdout(predicate::str::contains("Fully matched: 3"));

    let results = std::fs::read_to_string(fixture.run_dir.join("results.csv")).unwrap();
    assert_eq!(results, common::EXPECTED_RESULTS);
    assert!(!fixture.run_dir.join("top_unaligned_i1.csv").exists());
}

#[test]
fn test_count_debug_writes_unmatched_reports() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let out = dir.path().join("reports");

    amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .arg("--debug")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let i1 = std::fs::read_to_string(out.join("top_unaligned_i1.csv")).unwrap();
    assert_eq!(i1, "sequence,count\nCCCCC,1\n");
    let amps = std::fs::read_to_string(out.join("top_unaligned_amps.csv")).unwrap();
    assert_eq!(amps, "sequence,count\n");
    assert!(out.join("top_unaligned_i2.csv").exists());
    assert!(out.join("results.csv").exists());
}

#[test]
fn test_count_orientation_override() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");

    // Reverse-complementing index 2 leaves none of the index 2 reads matched
    amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .arg("--orientation")
        .arg("reverse-complement")
        .arg("--format")
        .arg("tsv")
        .assert()
        .success()
        .stdout(predicate::str::contains("AGGTT\tNA\tS2\t2"))
        .stdout(predicate::str::contains("NA\tNA\tRPP30\t1"));
}

#[test]
fn test_count_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");

    let output = amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_reads"], 4);
    assert_eq!(json["index2_orientation"], "forward");
    assert_eq!(json["results"][0]["amplicon"], "S2");
    assert_eq!(json["results"][0]["count"], 2);
}

#[test]
fn test_count_missing_fastq_names_file() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    std::fs::remove_file(fixture.run_dir.join("out/Undetermined_S0_I2_001.fastq.gz")).unwrap();

    amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Undetermined_S0_I2_001.fastq.gz"));
}

#[test]
fn test_count_rejects_malformed_table() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    std::fs::write(&fixture.amplicon_map, "sequence,target\nGACGTACGC,S2\nGA,bad\n").unwrap();

    amplicount()
        .arg("count")
        .arg(&fixture.run_dir)
        .arg("--plate-map")
        .arg(&fixture.plate_map)
        .arg("--amplicon-map")
        .arg(&fixture.amplicon_map)
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 3"));
}

#[test]
fn test_build_summary_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");
    let exported = dir.path().join("amps.json");

    amplicount()
        .arg("build")
        .arg(&fixture.amplicon_map)
        .arg("--channel")
        .arg("amplicon")
        .arg("--output")
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("References: 2"))
        .stdout(predicate::str::contains("Key width:  7"));

    assert!(exported.exists());

    amplicount()
        .arg("lookup")
        .arg("ACGTACC")
        .arg("gggggggg")
        .arg("--dictionary")
        .arg(&exported)
        .arg("--format")
        .arg("tsv")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACGTACC\tS2\tACGTACG"))
        .stdout(predicate::str::contains("GGGGGGGG\tNA\tNA\tNA"));
}

#[test]
fn test_lookup_from_plate_map() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = common::write_run(dir.path(), "run1");

    amplicount()
        .arg("lookup")
        .arg("AGGTT")
        .arg("--table")
        .arg(&fixture.plate_map)
        .arg("--channel")
        .arg("index1")
        .assert()
        .success()
        .stdout(predicate::str::contains("AGGTT\tA1 (AGGTT, exact match)"));
}

#[test]
fn test_lookup_requires_a_source() {
    amplicount()
        .arg("lookup")
        .arg("ACGT")
        .assert()
        .failure();
}
