//! Integration tests for the staymap CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "STAYMAP_LOG",
    "STAYMAP_RAGGED_ROWS",
    "STAYMAP_UNTERMINATED_QUOTES",
    "STAYMAP_FIND_ANCHOR",
    "STAYMAP_REQUIRED_FIELDS",
    "STAYMAP_RULES",
];

/// A staymap command isolated from the user's config files and environment
fn staymap(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("staymap").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const AIRBNB_CSV: &str = "\
Confirmation code,Guest name,Start date,End date,# of nights,Listing,Earnings
HMABC123,John Smith,03/01/2024,03/04/2024,3,Loft 4B,\"$1,234.50\"
HMXYZ789,\"Lee, Ann\",03/05/2024,03/07/2024,2,Loft 4B,$410.00
";

const RESERVATION_JSON: &str = r#"{
  "object": "reservation",
  "data": {
    "channelReservationId": "HMABC123",
    "guestName": "Ann Lee",
    "arrivalDate": "2024-06-01",
    "departureDate": "2024-06-04",
    "nights": 3,
    "financeField": [
      {"name": "baseRate", "total": 450},
      {"name": "cleaningFeeValue", "total": 85.5}
    ]
  }
}"#;

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    staymap(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("suggest"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("webhook"));
}

#[test]
fn test_version() {
    let tmp = TempDir::new().unwrap();
    staymap(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("staymap"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    staymap(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staymap"));
}

// ============================================================================
// Inspect
// ============================================================================

#[test]
fn test_inspect_shows_columns_and_samples() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", AIRBNB_CSV);

    staymap(&tmp)
        .arg("inspect")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Confirmation code"))
        .stdout(predicate::str::contains("HMABC123"))
        .stdout(predicate::str::contains("2 data row(s)"));
}

#[test]
fn test_inspect_json() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", "Guest,Check-in\nJohn Smith,2024-03-01\n");

    staymap(&tmp)
        .args(["inspect", "-f", "json"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sample_value\": \"John Smith\""));
}

#[test]
fn test_inspect_empty_file_fails() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "empty.csv", "\n  \n\n");

    staymap(&tmp)
        .arg("inspect")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no data"));
}

#[test]
fn test_ragged_rows_rejected_by_env() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "ragged.csv", "a,b,c\n1,2\n");

    staymap(&tmp)
        .arg("inspect")
        .arg(&csv)
        .assert()
        .success();

    staymap(&tmp)
        .env("STAYMAP_RAGGED_ROWS", "reject")
        .arg("inspect")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 3 cells, found 2"));
}

// ============================================================================
// Suggest
// ============================================================================

#[test]
fn test_suggest_from_csv_headers() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", AIRBNB_CSV);

    staymap(&tmp)
        .arg("suggest")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("reservationCode: Confirmation code"))
        .stdout(predicate::str::contains("guestName: Guest name"))
        .stdout(predicate::str::contains("checkInDate: Start date"));
}

#[test]
fn test_suggest_writes_output_file() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", AIRBNB_CSV);

    staymap(&tmp)
        .arg("suggest")
        .arg(&csv)
        .args(["--output", "mapping.yaml"])
        .assert()
        .success();

    let mapping = fs::read_to_string(tmp.path().join("mapping.yaml")).unwrap();
    assert!(mapping.contains("listingName: Listing"));
}

#[test]
fn test_suggest_from_payload_paths() {
    let tmp = TempDir::new().unwrap();
    let payload = write(
        &tmp,
        "payload.json",
        r#"{"booking": {"guest_name": "Ann", "check_in": "2024-01-01"}}"#,
    );

    staymap(&tmp)
        .args(["suggest", "--payload"])
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("guestName: booking.guest_name"));
}

#[test]
fn test_suggest_requires_a_source() {
    let tmp = TempDir::new().unwrap();
    staymap(&tmp).arg("suggest").assert().failure();
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_guest_and_check_in() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", "Guest,Check-in\nJohn Smith,2024-03-01\n");
    let mapping = write(&tmp, "mapping.yaml", "guestName: Guest\ncheckInDate: Check-in\n");

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"guestName\": \"John Smith\""))
        .stdout(predicate::str::contains("\"checkInDate\": \"2024-03-01\""))
        .stderr(predicate::str::contains("Import Summary"));
}

#[test]
fn test_import_auto_mapping() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", AIRBNB_CSV);

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--auto")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"guestName\": \"Lee, Ann\""))
        .stdout(predicate::str::contains("\"checkInDate\": \"2024-03-05\""))
        .stdout(predicate::str::contains("\"numNights\": 2"))
        .stdout(predicate::str::contains("\"netEarnings\": 1234.5"));
}

#[test]
fn test_import_field_errors_fail_unless_skipped() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "rates.csv", "Guest,Rate\nAnn,abc\nBob,99.50\n");
    let mapping = write(&tmp, "mapping.yaml", "guestName: Guest\nnightlyRate: Rate\n");

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 1: nightlyRate cannot read 'abc' as money"))
        .stderr(predicate::str::contains("1 field error(s) in 1 row(s)"));

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .arg("--skip-errors")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nightlyRate\": 99.5"));
}

#[test]
fn test_import_overrides() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "rates.csv", "Guest,Rate\nAnn,100\nBob,200\n");
    let mapping = write(&tmp, "mapping.yaml", "guestName: Guest\nnightlyRate: Rate\n");
    let overrides = write(
        &tmp,
        "overrides.yaml",
        "- row: 2\n  field: nightlyRate\n  value: \"$180\"\n  reason: discount\n",
    );

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .arg("--overrides")
        .arg(&overrides)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nightlyRate\": 100.0"))
        .stdout(predicate::str::contains("\"nightlyRate\": 180.0"))
        .stderr(predicate::str::contains("Overrides:"));
}

#[test]
fn test_import_csv_output() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", "Guest,Nights\n\"Smith, John\",3\n");
    let mapping = write(&tmp, "mapping.yaml", "guestName: Guest\nnumNights: Nights\n");

    staymap(&tmp)
        .args(["import", "-f", "csv"])
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .assert()
        .success()
        .stdout(predicate::str::contains("guestName,numNights\n\"Smith, John\",3\n"));
}

#[test]
fn test_import_bad_mapping_file() {
    let tmp = TempDir::new().unwrap();
    let csv = write(&tmp, "bookings.csv", "Guest\nAnn\n");
    let mapping = write(&tmp, "mapping.yaml", "guestName: [Guest\n");

    staymap(&tmp)
        .arg("import")
        .arg(&csv)
        .arg("--mapping")
        .arg(&mapping)
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
}

// ============================================================================
// Webhook
// ============================================================================

#[test]
fn test_webhook_suggested_mapping() {
    let tmp = TempDir::new().unwrap();
    let payload = write(&tmp, "reservation.json", RESERVATION_JSON);

    staymap(&tmp)
        .arg("webhook")
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"reservationCode\": \"HMABC123\""))
        .stdout(predicate::str::contains("\"accommodationFee\": 450.0"))
        .stdout(predicate::str::contains("\"cleaningFee\": 85.5"))
        .stdout(predicate::str::contains("\"salesTax\": null"));
}

#[test]
fn test_webhook_from_stdin_with_mapping() {
    let tmp = TempDir::new().unwrap();
    let mapping = write(
        &tmp,
        "mapping.yaml",
        "numNights: data.nights\ncleaningFee: 'data.financeField.find(f => f.name === \"cleaningFeeValue\").total'\n",
    );

    staymap(&tmp)
        .args(["webhook", "-", "--mapping"])
        .arg(&mapping)
        .write_stdin(RESERVATION_JSON)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"numNights\": 3"))
        .stdout(predicate::str::contains("\"cleaningFee\": 85.5"));
}

#[test]
fn test_webhook_check_passes() {
    let tmp = TempDir::new().unwrap();
    let payload = write(&tmp, "reservation.json", RESERVATION_JSON);

    staymap(&tmp)
        .args(["webhook", "--check"])
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("resolves every required field"));
}

#[test]
fn test_webhook_check_reports_problems() {
    let tmp = TempDir::new().unwrap();
    let payload = write(&tmp, "reservation.json", RESERVATION_JSON);
    let mapping = write(
        &tmp,
        "mapping.yaml",
        "reservationCode: data.channelReservationId\nguestName: data.guest\ncheckInDate: data.arrivalDate\n",
    );

    staymap(&tmp)
        .args(["webhook", "--check", "--mapping"])
        .arg(&mapping)
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("checkOutDate: not mapped"))
        .stdout(predicate::str::contains("guestName: path 'data.guest' did not resolve"))
        .stderr(predicate::str::contains("1 missing, 1 unresolved"));
}

#[test]
fn test_webhook_invalid_json() {
    let tmp = TempDir::new().unwrap();
    let payload = write(&tmp, "broken.json", "{\"data\": ");

    staymap(&tmp)
        .arg("webhook")
        .arg(&payload)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_show_key_from_env() {
    let tmp = TempDir::new().unwrap();
    staymap(&tmp)
        .env("STAYMAP_RAGGED_ROWS", "skip")
        .args(["config", "show", "ragged_rows"])
        .assert()
        .success()
        .stdout(predicate::str::diff("skip\n"));
}

#[test]
fn test_config_set_and_unset_directory_file() {
    let tmp = TempDir::new().unwrap();

    staymap(&tmp)
        .args(["config", "set", "find_anchor", "relative"])
        .assert()
        .success();
    let content = fs::read_to_string(tmp.path().join(".staymap.yaml")).unwrap();
    assert!(content.contains("find_anchor: relative"));

    staymap(&tmp)
        .args(["config", "show", "find_anchor"])
        .assert()
        .success()
        .stdout(predicate::str::diff("relative\n"));

    staymap(&tmp)
        .args(["config", "unset", "find_anchor"])
        .assert()
        .success();
    staymap(&tmp)
        .args(["config", "show", "find_anchor"])
        .assert()
        .success()
        .stdout(predicate::str::diff("legacy\n"));
}

#[test]
fn test_config_set_rejects_bad_values() {
    let tmp = TempDir::new().unwrap();

    staymap(&tmp)
        .args(["config", "set", "ragged_rows", "sometimes"])
        .assert()
        .failure();
    staymap(&tmp)
        .args(["config", "set", "editor", "vim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
    assert!(!tmp.path().join(".staymap.yaml").exists());
}

#[test]
fn test_config_set_keeps_malformed_file() {
    let tmp = TempDir::new().unwrap();
    let original = "ragged_rows: reject\nrules: rules.yaml\nfind_anchor: [relative\n";
    let path = write(&tmp, ".staymap.yaml", original);

    staymap(&tmp)
        .args(["config", "set", "unterminated_quotes", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);

    staymap(&tmp)
        .args(["config", "unset", "ragged_rows"])
        .assert()
        .failure();
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_config_set_rejects_non_mapping_file() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, ".staymap.yaml", "- ragged_rows\n");

    staymap(&tmp)
        .args(["config", "set", "ragged_rows", "skip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a mapping"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "- ragged_rows\n");
}

#[test]
fn test_directory_config_changes_parsing() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, ".staymap.yaml", "unterminated_quotes: strict\n");
    let csv = write(&tmp, "bad.csv", "a,b\n\"open,1\n");

    staymap(&tmp)
        .arg("inspect")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unterminated quoted field"));
}
