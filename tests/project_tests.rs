use assert_fs::prelude::*;
use predicates::prelude::*;
use std::fs;

const SCHOOL_YAML: &str = include_str!("fixtures/school.yaml");

#[test]
fn project_writes_forecast_report() {
    let input_file = assert_fs::NamedTempFile::new("school.yaml").unwrap();
    input_file.write_str(SCHOOL_YAML).unwrap();
    let output_file = assert_fs::NamedTempFile::new("projection.yaml").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("enrollment-forecasts");
    cmd.args([
        "project",
        "-i",
        input_file.path().to_str().unwrap(),
        "-o",
        output_file.path().to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Projection Report"))
        .stdout(predicate::str::contains("2026-2027 |"))
        .stdout(predicate::str::contains("2028-2029 |"))
        .stdout(predicate::str::contains("Projection written to"));

    let output = fs::read_to_string(output_file.path()).unwrap();
    assert!(output.contains("input_fingerprint:"));
    assert!(output.contains("2026-2027"));
    assert!(output.contains("fiscal_years:"));
    assert!(output.contains("optimization:"));
}

#[test]
fn project_rejects_unknown_grades() {
    let input_file = assert_fs::NamedTempFile::new("school.yaml").unwrap();
    input_file
        .write_str(&SCHOOL_YAML.replace("    CM2:\n", "    CM3:\n"))
        .unwrap();
    let output_file = assert_fs::NamedTempFile::new("projection.yaml").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("enrollment-forecasts");
    cmd.args([
        "project",
        "-i",
        input_file.path().to_str().unwrap(),
        "-o",
        output_file.path().to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("UnknownGrade"));
    output_file.assert(predicate::path::missing());
}
