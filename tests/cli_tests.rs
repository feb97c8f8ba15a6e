// CLI integration tests against the CoreMark fixture campaign
//
// Fixture: 24 runs over six registers of `core` plus one stalled run without
// a target register. At the root: 16 NE, 5 SDC, 3 SEFI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const CAMPAIGN: &str = "tests/fixtures/campaign.json";
const CONFIG: &str = "tests/fixtures/analysis.toml";

fn seuscope() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("seuscope")
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_default_summary() {
    seuscope()
        .args(["--campaign", CAMPAIGN, "--config", CONFIG])
        .assert()
        .success()
        .stdout(predicate::str::contains("Campaign summary for core"))
        .stdout(predicate::str::contains("Runs: 24"))
        .stdout(predicate::str::contains("Registers hit: 6/7"))
        .stdout(predicate::str::contains("Runs without a target register: 1"));
}

#[test]
fn test_classify_csv() {
    let stdout = stdout_of(seuscope().args([
        "--campaign",
        CAMPAIGN,
        "--config",
        CONFIG,
        "--report",
        "classify",
        "--format",
        "csv",
    ]));

    assert!(stdout.starts_with("run_id,class\n"));
    assert!(stdout.contains("seu_000,NE"));
    assert!(stdout.contains("seu_001,SDC"));
    assert!(stdout.contains("seu_003,SEFI"));
    assert!(!stdout.contains("seu_stall"));
    assert_eq!(stdout.lines().count(), 25);
}

#[test]
fn test_children_worst_first() {
    let stdout = stdout_of(seuscope().args([
        "--campaign",
        CAMPAIGN,
        "--config",
        CONFIG,
        "--report",
        "children",
    ]));

    let csr = stdout.find("csr").unwrap();
    let regfile = stdout.find("regfile").unwrap();
    let pc = stdout.find("  pc").unwrap();
    assert!(csr < regfile && regfile < pc);
}

#[test]
fn test_children_json_for_subtree() {
    let stdout = stdout_of(seuscope().args([
        "--campaign",
        CAMPAIGN,
        "--config",
        CONFIG,
        "--report",
        "children",
        "--node",
        "core.regfile",
        "--format",
        "json",
    ]));

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["report"], "children");
    assert_eq!(value["node"], "core.regfile");

    let names: Vec<&str> = value["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["x1", "x2", "x10"]);
    assert_eq!(value["children"][0]["n_runs"], 4);
}

#[test]
fn test_windowed_csv() {
    let stdout = stdout_of(seuscope().args([
        "--campaign",
        CAMPAIGN,
        "--config",
        CONFIG,
        "--report",
        "windowed",
        "--format",
        "csv",
    ]));

    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(rows.len(), 25);
    assert!(rows[0].starts_with("order,run_id,n,"));
    assert!(rows[1].starts_with("1000,seu_000,,"));
    assert!(rows[5].starts_with("1148,seu_004,8,"));
}

#[test]
fn test_window_larger_than_campaign_fails() {
    // default window of 150 runs does not fit 24 runs
    seuscope()
        .args(["--campaign", CAMPAIGN, "--report", "windowed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient data"));
}

#[test]
fn test_window_size_override() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--report",
            "windowed",
            "--window-size",
            "4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("window of 4 runs"));
}

#[test]
fn test_odd_window_rejected() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--report",
            "windowed",
            "--window-size",
            "5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("window_size"));
}

#[test]
fn test_confidence_report() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--config",
            CONFIG,
            "--report",
            "confidence",
            "--confidence",
            "0.9",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("24 runs, 90.0% confidence"))
        .stdout(predicate::str::contains("NE"));
}

#[test]
fn test_tree_report() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--config",
            CONFIG,
            "--report",
            "tree",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("├── regfile (12 runs"))
        .stdout(predicate::str::contains("mtvec (no runs)"));
}

#[test]
fn test_consistency_by_register() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--config",
            CONFIG,
            "--report",
            "consistency",
            "--keys",
            "register",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 groups"));
}

#[test]
fn test_consistency_unique_injections_agree() {
    seuscope()
        .args([
            "--campaign",
            CAMPAIGN,
            "--config",
            CONFIG,
            "--report",
            "consistency",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("agree"));
}

#[test]
fn test_adjusted_json() {
    let stdout = stdout_of(seuscope().args([
        "--campaign",
        CAMPAIGN,
        "--config",
        CONFIG,
        "--report",
        "adjusted",
        "--cycles",
        "1000",
        "--bits",
        "32",
        "--format",
        "json",
    ]));

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let silent = value["probability"]["rates"]["silent"].as_f64().unwrap();
    assert!((silent - 32000.0 * 16.0 / 24.0).abs() < 1e-6);
    assert_eq!(value["probability"]["n_runs"], 24);
}

#[test]
fn test_collisions_without_campaign() {
    seuscope()
        .args([
            "--report", "collisions", "--cycles", "100", "--bits", "10", "--runs", "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Injection space: 100 cycles × 10 bits"))
        .stdout(predicate::str::contains("Expected runs on an already-hit point"));
}

#[test]
fn test_collisions_missing_parameters() {
    seuscope()
        .args(["--report", "collisions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--cycles"));
}

#[test]
fn test_missing_campaign() {
    seuscope()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Must specify --campaign"));
}

#[test]
fn test_unknown_node() {
    seuscope()
        .args(["--campaign", CAMPAIGN, "--node", "gpu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No register tree node matches 'gpu'"));
}

#[test]
fn test_malformed_campaign_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{\"records\": [").unwrap();
    file.flush().unwrap();

    seuscope()
        .arg("--campaign")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse campaign JSON"));
}

#[test]
fn test_duplicate_run_ids_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"register_paths": ["soc.r0"], "golden": {{"crc": 1}},
            "records": [{{"id": "a", "register": "soc.r0", "fields": {{"crc": 1}}}},
                        {{"id": "a", "register": "soc.r0", "fields": {{"crc": 2}}}}]}}"#
    )
    .unwrap();
    file.flush().unwrap();

    seuscope()
        .arg("--campaign")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate run id 'a'"));
}
