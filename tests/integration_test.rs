//! Integration tests for the ledger ingest CLI.
//!
//! These tests run the actual binary against the CSV files in `tests/data`
//! and inspect both the summary messages on stdout and the store file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Command with a fixed year and a store inside `dir`
fn ingest_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ledger-ingest").unwrap();
    cmd.env_remove("LEDGER_ACCOUNT_ID")
        .env_remove("LEDGER_NOTIFY_EMAIL")
        .env_remove("LEDGER_STORE_PATH")
        .arg("--year")
        .arg("2024")
        .arg("--store")
        .arg(store_path(dir));
    cmd
}

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("transactions.jsonl")
}

/// Parse every JSON line in `text`
fn json_lines(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn read_store(path: &Path) -> Vec<Value> {
    json_lines(&fs::read_to_string(path).unwrap_or_default())
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap();
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_sample_a_summary_and_store() {
    let dir = TempDir::new().unwrap();
    let assert = ingest_cmd(&dir)
        .arg("--account-id")
        .arg("acc-1")
        .arg("--email")
        .arg("owner@example.com")
        .arg(test_data_path("sample_a.csv"))
        .assert()
        .success();

    let messages = json_lines(&String::from_utf8(assert.get_output().stdout.clone()).unwrap());
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message["to"], "owner@example.com");
    assert_eq!(message["account_id"], "acc-1");
    assert_close(&message["summary"]["total_balance"], 800.0);

    let january = &message["summary"]["yearly_data"]["2024"]["1"];
    assert_eq!(january["transaction_count"], 4);
    assert_close(&january["average_debit"], -100.0);
    assert_close(&january["average_credit"], 500.0);

    let stored = read_store(&store_path(&dir));
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0]["internal_id"], 1);
    assert_eq!(stored[0]["date"], "2024-01-01T00:00:00Z");
    assert_close(&stored[0]["amount"], -150.0);
    assert_eq!(stored[0]["account_id"], "acc-1");
    assert!(stored.iter().all(|item| item["id"].as_str().unwrap().len() == 36));
}

#[test]
fn test_sample_b_multiple_months() {
    let dir = TempDir::new().unwrap();
    let assert = ingest_cmd(&dir)
        .arg("--email")
        .arg("owner@example.com")
        .arg(test_data_path("sample_b_multi_month.csv"))
        .assert()
        .success();

    let messages = json_lines(&String::from_utf8(assert.get_output().stdout.clone()).unwrap());
    let summary = &messages[0]["summary"];
    // Account id defaults to the file stem
    assert_eq!(messages[0]["account_id"], "sample_b_multi_month");
    assert_close(&summary["total_balance"], 34.74);

    let years: Vec<&String> = summary["yearly_data"].as_object().unwrap().keys().collect();
    assert_eq!(years, vec!["2023", "2024"]);

    let december = &summary["yearly_data"]["2023"]["12"];
    assert_eq!(december["transaction_count"], 1);
    assert_close(&december["average_debit"], -5.0);
    assert_close(&december["average_credit"], 0.0);

    let july = &summary["yearly_data"]["2024"]["7"];
    assert_eq!(july["transaction_count"], 2);
    assert_close(&july["average_debit"], -10.3);
    assert_close(&july["average_credit"], 60.5);

    let august = &summary["yearly_data"]["2024"]["8"];
    assert_eq!(august["transaction_count"], 3);
    assert_close(&august["average_debit"], -20.46);
    assert_close(&august["average_credit"], 10.0);
}

#[test]
fn test_sample_c_whitespace_handling() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg(test_data_path("sample_c_whitespace.csv"))
        .assert()
        .success();

    let stored = read_store(&store_path(&dir));
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["date"], "2024-03-04T00:00:00Z");
    assert_close(&stored[1]["amount"], 2.75);
}

#[test]
fn test_no_email_prints_nothing() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg(test_data_path("sample_a.csv"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(read_store(&store_path(&dir)).len(), 4);
}

#[test]
fn test_header_only_file() {
    let dir = TempDir::new().unwrap();
    let assert = ingest_cmd(&dir)
        .arg("--email")
        .arg("owner@example.com")
        .arg(test_data_path("header_only.csv"))
        .assert()
        .success();

    let messages = json_lines(&String::from_utf8(assert.get_output().stdout.clone()).unwrap());
    assert_close(&messages[0]["summary"]["total_balance"], 0.0);
    assert!(messages[0]["summary"]["yearly_data"].as_object().unwrap().is_empty());
    assert!(read_store(&store_path(&dir)).is_empty());
}

#[test]
fn test_invalid_date_aborts_file() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg(test_data_path("invalid_date.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));

    assert!(read_store(&store_path(&dir)).is_empty());
}

#[test]
fn test_field_count_error() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg(test_data_path("invalid_field_count.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected 3 fields at line 2"));
}

#[test]
fn test_bad_file_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg(test_data_path("invalid_date.csv"))
        .arg(test_data_path("sample_a.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 files failed"));

    assert_eq!(read_store(&store_path(&dir)).len(), 4);
}

#[test]
fn test_missing_file_error() {
    let dir = TempDir::new().unwrap();
    ingest_cmd(&dir)
        .arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.csv"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("ledger-ingest").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("FILES"));
}
