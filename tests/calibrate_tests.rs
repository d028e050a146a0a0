use assert_fs::prelude::*;
use predicates::prelude::*;
use std::fs;

const SCHOOL_YAML: &str = include_str!("fixtures/school.yaml");

#[test]
fn calibrate_writes_outcome_and_prints_report() {
    let input_file = assert_fs::NamedTempFile::new("school.yaml").unwrap();
    input_file.write_str(SCHOOL_YAML).unwrap();
    let output_file = assert_fs::NamedTempFile::new("calibration.yaml").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("enrollment-forecasts");
    cmd.args([
        "calibrate",
        "-i",
        input_file.path().to_str().unwrap(),
        "-o",
        output_file.path().to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Calibration Report"))
        .stdout(predicate::str::contains("Years available: 2023, 2024, 2025"));

    let output = fs::read_to_string(output_file.path()).unwrap();
    assert!(output.contains("success: true"));
    assert!(output.contains("weighted_progression:"));
    assert!(output.contains("CE1:"));
}

#[test]
fn rates_writes_effective_rates() {
    let input_file = assert_fs::NamedTempFile::new("school.yaml").unwrap();
    input_file.write_str(SCHOOL_YAML).unwrap();
    let output_file = assert_fs::NamedTempFile::new("rates.yaml").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("enrollment-forecasts");
    cmd.args([
        "rates",
        "-i",
        input_file.path().to_str().unwrap(),
        "-o",
        output_file.path().to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Effective Rates"))
        .stdout(predicate::str::contains("students | override | high"));

    let output = fs::read_to_string(output_file.path()).unwrap();
    assert!(output.contains("source: override"));
    assert!(output.contains("source: calibrated"));
}
