// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for tap13-parser
//!
//! These tests parse fixture streams shaped like real harness output and
//! check the resulting trees.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::json;
use similar::TextDiff;
use tap13_parser::{ParseError, ParserConfig, ResultTree, TapLine, parse_reader, parse_str};

/// Get the fixtures directory for test data
fn fixtures_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    Path::new(&manifest_dir).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {name}: {e}"))
}

fn parse_fixture(name: &str) -> ResultTree {
    parse_str(&read_fixture(name), ParserConfig::default())
        .unwrap_or_else(|e| panic!("Failed to parse {name}: {e}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tap13_parser=debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_simple_fixture_matches_golden_json() {
    let tree = parse_fixture("simple.tap");
    let actual = serde_json::to_value(&tree).expect("Failed to serialize tree");
    let expected: serde_json::Value =
        serde_json::from_str(&read_fixture("simple.json")).expect("Failed to parse golden JSON");

    if actual != expected {
        let actual_text = serde_json::to_string_pretty(&actual).expect("pretty actual");
        let expected_text = serde_json::to_string_pretty(&expected).expect("pretty expected");
        let diff = TextDiff::from_lines(&expected_text, &actual_text);
        panic!(
            "Tree does not match golden JSON:\n{}",
            diff.unified_diff().header("expected", "actual")
        );
    }
}

#[test]
fn test_simple_fixture_summary() {
    let tree = parse_fixture("simple.tap");
    let summary = tree.summary();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.todo, 1);
    // The only failure is a TODO
    assert!(tree.all_passed());
}

#[test]
fn test_subtests_fixture() {
    init_tracing();
    let tree = parse_fixture("subtests.tap");

    assert_eq!(tree.number_of_test_results(), 2);
    assert_eq!(tree.plan.as_ref().map(|p| p.last_test_number), Some(2));

    let parser = tree.test_result(1).expect("Should have result 1");
    assert_eq!(parser.description, "parser");
    let parser_subtest = parser.subtest.as_ref().expect("parser subtest");
    assert_eq!(parser_subtest.number_of_test_results(), 2);
    assert!(parser_subtest.all_passed());
    let comments: Vec<&str> = parser.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(comments, vec!["Subtest: diagnostics"]);

    let diagnostics = tree.test_result(2).expect("Should have result 2");
    assert!(diagnostics.failed());
    let inner = diagnostics
        .subtest
        .as_ref()
        .and_then(|t| t.test_result(1))
        .expect("diagnostics subtest result");
    assert_eq!(inner.description, "parses yaml");
    assert_eq!(
        inner.diagnostic.clone().map(serde_json::Value::Object),
        Some(json!({
            "message": "unexpected token",
            "severity": "fail",
            "at": {"line": 12, "column": 4}
        }))
    );
}

#[test]
fn test_subtests_fixture_flat() {
    // Inner plans land on the outer level and collide
    let err = parse_str(&read_fixture("subtests.tap"), ParserConfig::flat())
        .expect_err("Should fail flat");
    assert!(matches!(err, ParseError::DuplicatePlan { line: 8, .. }));

    let tree = parse_str("    ok 1 - inner\nok 2 - outer\n1..2\n", ParserConfig::flat())
        .expect("Should parse flat");
    assert_eq!(tree.number_of_test_results(), 2);
    assert!(tree.test_results().all(|r| r.subtest.is_none()));
}

#[test]
fn test_bail_out_fixture() {
    let tree = parse_fixture("bail_out.tap");

    assert!(tree.contains_bail_out());
    assert!(!tree.all_passed());
    let bail_out = tree.bail_outs().next().expect("Should have bail out");
    assert_eq!(bail_out.reason, "database unavailable");
    assert_eq!(
        bail_out.comment.as_ref().map(|c| c.text.as_str()),
        Some("giving up")
    );
    assert_eq!(tree.number_of_test_results(), 1);
}

#[test]
fn test_harness_output_fixture() {
    let tree = parse_fixture("harness_output.tap");

    let numbers: Vec<u32> = tree.test_results().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let texts: Vec<&str> = tree
        .lines
        .iter()
        .filter_map(|line| match line {
            TapLine::Text(text) => Some(text.value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["some harness noise on stdout"]);

    let run = tree.test_result(2).expect("Should have result 2");
    assert_eq!(
        run.diagnostic.clone().map(serde_json::Value::Object),
        Some(json!({"duration_ms": 12, "tags": ["fast", "unit"]}))
    );
}

#[test]
fn test_parse_reader_from_file() {
    let file = File::open(fixtures_dir().join("subtests.tap")).expect("open fixture");
    let tree = parse_reader(BufReader::new(file), ParserConfig::default()).expect("Should parse");
    assert_eq!(tree, parse_fixture("subtests.tap"));
}

#[test]
fn test_missing_plan_depends_on_config() {
    let input = "TAP version 13\nok 1 - only\n";

    let err = parse_str(input, ParserConfig::default()).expect_err("Should fail");
    assert!(matches!(err, ParseError::MissingPlan));

    let tree = parse_str(input, ParserConfig::default().with_plan_required(false))
        .expect("Should parse without plan");
    assert!(tree.plan.is_none());
    assert_eq!(tree.number_of_test_results(), 1);
}

#[test]
fn test_errors_carry_line_numbers() {
    let input = "TAP version 13\n1..2\nok 1\n\nok 2\n1..3\n";
    let err = parse_str(input, ParserConfig::default()).expect_err("Should fail");

    assert_eq!(err.line(), Some(6));
    assert!(err.to_string().contains("1..3"));
}

#[test]
fn test_tree_round_trips_through_json() {
    let tree = parse_fixture("subtests.tap");
    let json = serde_json::to_string(&tree).expect("Failed to serialize");
    let back: ResultTree = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(back, tree);
}
