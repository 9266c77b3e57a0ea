// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Integration tests for volume verification

use cadex::verify::{
    load_reference, verify, CheckStatus, Tolerance, VerificationReporter, VolumeTable,
};
use std::fs;
use std::path::Path;

fn annotated(dir: &Path, name: &str, volume: &str) {
    fs::write(
        dir.join(name),
        format!("part = ex.part\n\n# Volume: {} mm^3\n", volume),
    )
    .unwrap();
}

#[test]
fn test_verify_against_toml_reference() {
    let dir = tempfile::tempdir().unwrap();
    let measured_dir = dir.path().join("executed");
    fs::create_dir(&measured_dir).unwrap();
    annotated(&measured_dir, "example-01.py", "48000.00000000001");
    annotated(&measured_dir, "example-02.py", "44925.08");
    annotated(&measured_dir, "example-03.py", "Error during execution");
    fs::write(measured_dir.join("notes.txt"), "# Volume: 1 mm^3\n").unwrap();

    let reference_path = dir.path().join("reference.toml");
    fs::write(
        &reference_path,
        "[volumes]\n\"example-01\" = 48000.0\n\"example-02\" = 45000.0\n\
\"example-03\" = 1000.0\n\"example-04\" = 12.5\n",
    )
    .unwrap();

    let measured = VolumeTable::from_annotated_dir(&measured_dir, "py").unwrap();
    assert_eq!(measured.len(), 3);
    let reference = load_reference(&reference_path, "py").unwrap();

    let report = verify(&measured, &reference, Tolerance::default());

    assert_eq!(report.total(), 4);
    assert_eq!(report.matched, 1);
    assert_eq!(report.mismatched, 1);
    assert_eq!(report.unmeasured, 1);
    assert_eq!(report.missing, 1);
    assert!(report.has_failures());

    let statuses: Vec<_> = report.checks.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Match,
            CheckStatus::Mismatch,
            CheckStatus::Unmeasured,
            CheckStatus::MissingReference,
        ]
    );
}

#[test]
fn test_verify_against_annotated_directory() {
    let dir = tempfile::tempdir().unwrap();
    let before = dir.path().join("before");
    let after = dir.path().join("after");
    fs::create_dir(&before).unwrap();
    fs::create_dir(&after).unwrap();
    annotated(&before, "example-01.py", "1000.0");
    annotated(&after, "example-01.py", "1000.05");

    let measured = VolumeTable::from_annotated_dir(&after, "py").unwrap();
    let reference = load_reference(&before, "py").unwrap();

    let strict = verify(&measured, &reference, Tolerance::default());
    assert_eq!(strict.mismatched, 1);

    let loose = verify(&measured, &reference, Tolerance::new(1e-3, 0.0));
    assert_eq!(loose.matched, 1);
    assert!(!loose.has_failures());
}

#[test]
fn test_reports_written() {
    let dir = tempfile::tempdir().unwrap();
    let measured_dir = dir.path().join("executed");
    fs::create_dir(&measured_dir).unwrap();
    annotated(&measured_dir, "example-01.py", "10.0");

    let measured = VolumeTable::from_annotated_dir(&measured_dir, "py").unwrap();
    let report = verify(&measured, &measured, Tolerance::default());

    let json = dir.path().join("verify_report.json");
    let md = dir.path().join("verify_report.md");
    VerificationReporter::write_json(&report, &json).unwrap();
    VerificationReporter::write_markdown(&report, &md).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["matched"], 1);
    assert!(fs::read_to_string(&md)
        .unwrap()
        .contains("- **Matched:** 1 (100.0%)"));
}

#[test]
fn test_missing_reference_path() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_reference(&dir.path().join("absent.toml"), "py").is_err());
}
