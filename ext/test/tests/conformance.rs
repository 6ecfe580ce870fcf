//! Conformance tests that run YAML fixtures against verdict
//!
//! Run with: cargo test -p verdict-test --test conformance --features verdict-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};
use verdict_test::fixture::Fixture;

/// The fixtures directory of this crate
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    assert!(path.exists(), "Fixture file does not exist: {}", path.display());

    let yaml = fs::read_to_string(&path).expect("read yaml");

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "No fixtures in {}", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_precedence() {
    run_fixture_file("01_precedence.yaml");
}

#[test]
fn test_default_success() {
    run_fixture_file("02_default_success.yaml");
}

#[test]
fn test_problem_defaults() {
    run_fixture_file("03_problem_defaults.yaml");
}

#[test]
fn test_headers() {
    run_fixture_file("04_headers.yaml");
}

#[test]
fn test_metadata() {
    run_fixture_file("05_metadata.yaml");
}

#[test]
fn test_validation() {
    run_fixture_file("06_validation.yaml");
}

#[test]
fn test_no_match() {
    run_fixture_file("07_no_match.yaml");
}

#[test]
fn test_config_errors() {
    run_fixture_file("08_config_errors.yaml");
}

#[test]
fn test_every_fixture_file_is_covered() {
    let mut names: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml") || name.ends_with(".yml"))
        .collect();
    names.sort();
    assert_eq!(names.len(), 8, "new fixture files need a test: {names:?}");
}
