//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

const RECORDS: &str = r#"{"medium": "Oil on canvas", "classification": "Painting"}
{"medium": "Oil on board", "classification": "Painting"}
{"medium": "Acrylic on canvas", "classification": "Painting"}
{"medium": "Etching and aquatint", "classification": "Print"}

{"medium": "", "classification": "Print"}
"#;

/// A temp dir holding `records.ndjson`.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("records.ndjson"), RECORDS).unwrap();
    tmp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("ngrams"))
        .stdout(predicate::str::contains("lookup"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MEDIUM_NGRAMS_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let output = cmd().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["config"]["selection"].is_array());
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Ngrams Command
// =============================================================================

#[test]
fn ngrams_json_selects_by_min_count() {
    let tmp = workspace();
    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "records.ndjson",
            "--category",
            "Painting",
            "-n",
            "1",
            "--min-count",
            "2",
            "--json",
        ])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["category"], "Painting");
    assert_eq!(json["documents"], 3);
    assert_eq!(json["total"], 9);
    let names: Vec<&str> = json["selected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ngram"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["on", "oil", "canvas"]);
}

#[test]
fn ngrams_bigram_coverage() {
    let tmp = workspace();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--color",
            "never",
            "ngrams",
            "--source",
            "records.ndjson",
            "--category",
            "Painting",
            "-n",
            "2",
            "--coverage",
            "0.5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("oil on"))
        .stdout(predicate::str::contains("on canvas"))
        .stdout(predicate::str::contains("on board").not());
}

#[test]
fn ngrams_rejects_zero_length() {
    let tmp = workspace();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "records.ndjson",
            "-n",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("n-gram size"));
}

#[test]
fn ngrams_rejects_coverage_out_of_range() {
    let tmp = workspace();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "records.ndjson",
            "--coverage",
            "1.5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("coverage threshold"));
}

#[test]
fn ngrams_rejects_negative_floor_before_loading() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "missing.ndjson",
            "--min-count=-1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("frequency floor"))
        .stderr(predicate::str::contains("missing.ndjson").not());
}

#[test]
fn ngrams_rejects_configured_threshold_before_loading() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".medium-ngrams.toml"),
        "[selection.unigram]\nmode = \"coverage\"\nthreshold = 2.0\n",
    )
    .unwrap();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "missing.ndjson",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("coverage threshold"))
        .stderr(predicate::str::contains("missing.ndjson").not());
}

#[test]
fn min_count_and_coverage_conflict() {
    cmd()
        .args(["ngrams", "--min-count", "2", "--coverage", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn malformed_record_fails_with_line_number() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("records.ndjson"),
        "{\"medium\": \"Oil on canvas\"}\nnot json\n",
    )
    .unwrap();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "ngrams",
            "--source",
            "records.ndjson",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

// =============================================================================
// Analyze Command
// =============================================================================

#[test]
fn analyze_no_match_writes_csv_per_category() {
    let tmp = workspace();
    let out = tmp.path().join("out");
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--quiet",
            "analyze",
            "--source",
            "records.ndjson",
            "--category",
            "Painting",
            "--category",
            "all",
            "--sizes",
            "1,2",
            "--out",
            out.to_str().unwrap(),
            "--no-match",
        ])
        .assert()
        .success();

    let painting = fs::read_to_string(out.join("painting.ngrams.csv")).unwrap();
    let mut lines = painting.lines();
    assert_eq!(
        lines.next(),
        Some("length,category,ngram,frequency,aat_id,aat_name,aat_facet,aat_record_type,match")
    );
    assert!(painting.contains("1,Painting,on,3,,,,,"));
    assert!(painting.contains("2,Painting,oil on,2,,,,,"));

    let all = fs::read_to_string(out.join("all.ngrams.csv")).unwrap();
    assert!(all.lines().skip(1).all(|l| l.contains(",all,")));
}

#[test]
fn analyze_json_summary() {
    let tmp = workspace();
    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "analyze",
            "--source",
            "records.ndjson",
            "--category",
            "Print",
            "--sizes",
            "1",
            "--out",
            "csv",
            "--no-match",
            "--json",
        ])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let summary = &json["categories"][0];
    assert_eq!(summary["category"], "Print");
    assert_eq!(summary["documents"], 1);
    assert_eq!(summary["lengths"][0]["n"], 1);
    assert!(json.get("failures").is_none());
    assert!(tmp.path().join("csv").join("print.ngrams.csv").is_file());
}

#[test]
fn analyze_missing_source_fails() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "analyze",
            "--source",
            "missing.ndjson",
            "--no-match",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.ndjson"));
}

#[test]
fn analyze_without_source_fails() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "analyze", "--no-match"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source"));
}

#[test]
fn analyze_uses_configured_source_and_rules() {
    let tmp = workspace();
    fs::write(
        tmp.path().join(".medium-ngrams.toml"),
        r#"source = "records.ndjson"
categories = ["Painting"]
sizes = [1]
output_dir = "reports"

[selection.unigram]
mode = "minimum-count"
floor = 3
"#,
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "-q", "analyze", "--no-match"])
        .assert()
        .success();

    let csv = fs::read_to_string(tmp.path().join("reports").join("painting.ngrams.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("1,Painting,on,3"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn lookup_requires_phrase() {
    cmd()
        .arg("lookup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}
