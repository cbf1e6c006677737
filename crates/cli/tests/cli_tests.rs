// End-to-end tests of the gstmatch binary against the recon fixtures.
//
// stdout carries only requested output (tables, --json); progress and
// summaries go to stderr.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "..", "recon", "tests", "fixtures", name]
        .iter()
        .collect();
    path.to_string_lossy().into_owned()
}

/// Run in an empty directory so no stray gstmatch.toml is picked up.
fn gstmatch(dir: &tempfile::TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gstmatch"))
        .current_dir(dir.path())
        .env_remove("GSTMATCH_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run gstmatch")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "exit: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// match
// ===========================================================================

#[test]
fn match_json_lists_every_name_once() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(&dir, &["match", &fixture("books.csv"), &fixture("returns.csv"), "--json"]);
    let entries = stdout_json(&out);
    let entries = entries.as_array().expect("array of entries");

    assert_eq!(entries.len(), 6);
    // Review order puts confirmed pairs first.
    assert_eq!(entries[0]["confirmed"], true);
    assert_eq!(entries[1]["confirmed"], true);
    assert!(entries[2..].iter().all(|e| e["confirmed"] == false));

    let sharma = entries
        .iter()
        .find(|e| e["returns_name"] == "SHARMA TRADERS")
        .unwrap();
    assert_eq!(sharma["books_name"], "Sharma Traders");
    assert_eq!(sharma["score"], 100);
}

#[test]
fn match_threshold_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &[
            "match",
            &fixture("books.csv"),
            &fixture("returns.csv"),
            "--threshold",
            "100",
            "--auto-confirm",
            "100",
            "--json",
        ],
    );
    let entries = stdout_json(&out);
    let pairs = entries
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| !e["books_name"].is_null() && !e["returns_name"].is_null())
        .count();
    assert_eq!(pairs, 1, "only the exact Sharma spelling survives threshold 100");
}

#[test]
fn match_rejects_inconsistent_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &["match", &fixture("books.csv"), &fixture("returns.csv"), "--threshold", "95"],
    );
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("error:"));
}

#[test]
fn match_table_csv_layout() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("matches.csv");
    let out = gstmatch(
        &dir,
        &["match", &fixture("books.csv"), &fixture("returns.csv"), "-o", table.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let text = std::fs::read_to_string(&table).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("GSTR-2A Party,Tally Party,Score,Manual Confirmation"));
    assert_eq!(lines.count(), 6);
}

// ===========================================================================
// reconcile
// ===========================================================================

#[test]
fn reconcile_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &["reconcile", &fixture("books.csv"), &fixture("returns.csv"), "--json"],
    );
    let result = stdout_json(&out);

    assert_eq!(result["meta"]["gstin_available"], true);
    let summary = &result["summary"];
    assert_eq!(summary["total_entities"], 5);
    assert_eq!(summary["both"], 2);
    assert_eq!(summary["returns_only"], 1);
    assert_eq!(summary["books_only"], 2);
    assert_eq!(summary["variance_totals"]["integrated_tax"], -900);
    assert!(result["matches"].is_null());
}

#[test]
fn reconcile_with_reviewed_matches_writes_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("matches.csv");
    let report = dir.path().join("report.xlsx");

    let out = gstmatch(
        &dir,
        &["match", &fixture("books.csv"), &fixture("returns.csv"), "-o", table.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let out = gstmatch(
        &dir,
        &[
            "reconcile",
            &fixture("books.csv"),
            &fixture("returns.csv"),
            "--matches",
            table.to_str().unwrap(),
            "-o",
            report.to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(report.metadata().unwrap().len() > 0);
    let err = stderr(&out);
    assert!(err.contains("using 2 confirmed pairs"), "{err}");
    assert!(err.contains("5 suppliers"), "{err}");
}

#[test]
fn reconcile_json_report_file_carries_matches() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("matches.json");
    let report = dir.path().join("report.json");

    let out = gstmatch(
        &dir,
        &["match", &fixture("books.csv"), &fixture("returns.csv"), "-o", table.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let out = gstmatch(
        &dir,
        &[
            "reconcile",
            &fixture("books.csv"),
            &fixture("returns.csv"),
            "-m",
            table.to_str().unwrap(),
            "-o",
            report.to_str().unwrap(),
            "--quiet",
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(out.stderr.is_empty(), "--quiet keeps stderr clean");

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["matches"].as_array().unwrap().len(), 6);
    assert_eq!(value["variances"].as_array().unwrap().len(), 5);
}

#[test]
fn fail_on_variance_sets_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &["reconcile", &fixture("books.csv"), &fixture("returns.csv"), "--fail-on-variance"],
    );
    assert_eq!(out.status.code(), Some(7));

    // Same ledger on both sides reconciles cleanly.
    let out = gstmatch(
        &dir,
        &["reconcile", &fixture("returns.csv"), &fixture("returns.csv"), "--fail-on-variance"],
    );
    assert!(out.status.success(), "{}", stderr(&out));
}

#[test]
fn reconcile_invoices() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &["reconcile", &fixture("books.csv"), &fixture("returns.csv"), "--invoices", "--json"],
    );
    let result = stdout_json(&out);
    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    let a2 = rows.iter().find(|r| r["invoice_number"] == "A-2").unwrap();
    assert_eq!(a2["presence"], "both");
    assert_eq!(a2["variance"]["integrated_tax"], 900);
}

#[test]
fn missing_gstin_column_warns() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(
        &dir,
        &["reconcile", &fixture("books.csv"), &fixture("returns-no-gstin.csv")],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("GSTIN of supplier"), "{err}");
    assert!(err.contains("6 suppliers"), "{err}");
}

// ===========================================================================
// replace
// ===========================================================================

#[test]
fn replace_renames_confirmed_books_suppliers() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("matches.csv");
    std::fs::write(
        &table,
        "GSTR-2A Party,Tally Party,Score,Manual Confirmation\n\
         Acme Pvt. Ltd.,Acme Pvt Ltd,92,Yes\n\
         New Age Plastics,Gupta Steel,40,No\n",
    )
    .unwrap();
    let output = dir.path().join("replaced.csv");

    let out = gstmatch(
        &dir,
        &[
            "replace",
            &fixture("books.csv"),
            "--matches",
            table.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let text = std::fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Supplier,GSTIN of supplier"));
    assert!(lines.next().unwrap().starts_with("Acme Pvt. Ltd.,27AAAAA0000A1Z5,A-1"));
    assert!(text.contains("ACME PRIVATE LIMITED"));
    assert!(text.contains("Gupta Steel"));
}

#[test]
fn bad_confirmation_value_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("matches.csv");
    std::fs::write(
        &table,
        "GSTR-2A Party,Tally Party,Score,Manual Confirmation\nA,B,90,perhaps\n",
    )
    .unwrap();
    let out = gstmatch(
        &dir,
        &["replace", &fixture("books.csv"), "-m", table.to_str().unwrap(), "-o", "out.csv"],
    );
    assert_eq!(out.status.code(), Some(5));
    let err = stderr(&out);
    assert!(err.contains("row 2"), "{err}");
    assert!(err.contains("hint:"), "{err}");
}

// ===========================================================================
// config + errors
// ===========================================================================

#[test]
fn config_renames_supplier_column() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("gstmatch.toml"), "[columns]\nsupplier_name = \"Party\"\n").unwrap();
    let out = gstmatch(&dir, &["reconcile", &fixture("books.csv"), &fixture("returns.csv")]);
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("'Party' not found"), "{err}");
    assert!(err.contains("Invoice number"), "lists available columns: {err}");
    assert!(err.contains("hint:"), "{err}");
}

#[test]
fn validate_reports_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    std::fs::write(&path, "[matching]\nthreshold = 75\nscorer = \"token_sort\"\n").unwrap();
    let out = gstmatch(&dir, &["validate", path.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("threshold 75"), "{stdout}");
    assert!(stdout.contains("token_sort"), "{stdout}");
}

#[test]
fn validate_rejects_unknown_keys_and_bad_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let typo = dir.path().join("typo.toml");
    std::fs::write(&typo, "[matching]\nthreshhold = 75\n").unwrap();
    let out = gstmatch(&dir, &["validate", typo.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));

    let range = dir.path().join("range.toml");
    std::fs::write(&range, "[matching]\nthreshold = 95\nauto_confirm = 90\n").unwrap();
    let out = gstmatch(&dir, &["validate", range.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn unsupported_input_extension() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(&dir, &["match", "books.pdf", "returns.pdf"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = gstmatch(&dir, &["match", "nope.csv", &fixture("returns.csv")]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("nope.csv"));
}
