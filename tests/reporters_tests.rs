//! Report rendering over a realistic batch of results.

use std::time::Duration;

use rvd_e2e::harness::TestResult;
use rvd_e2e::reporters::{ConsoleReporter, HtmlReporter, JsonReporter, Reporter};
use rvd_e2e::validators::Verdict;

fn batch() -> Vec<TestResult> {
    let mut ok = TestResult::new("bv_video_download");
    ok.passed = true;
    ok.duration = Duration::from_millis(12_500);
    ok.output = "Download completed".to_string();
    ok.record("output", Verdict::pass());
    ok.record("file", Verdict::pass());

    let mut bad = TestResult::new("invalid_url");
    bad.duration = Duration::from_millis(500);
    bad.record("error_message", Verdict::fail("Output does not contain any of: error, invalid"));
    bad.error = "Expected error message not found in output".to_string();

    let mut slow = TestResult::new("network_error");
    slow.duration = Duration::from_secs(120);
    slow.error = "Test timed out after 120 seconds\nTeardown failed: busy".to_string();

    vec![ok, bad, slow]
}

#[test]
fn test_console_report_plain() {
    let report = ConsoleReporter::new(false, false).generate(&batch());
    insta::assert_snapshot!(report.trim(), @r"
    ======================================================================
    TEST RESULTS
    ======================================================================
    ✓ PASS bv_video_download (12.50s)
    ✗ FAIL invalid_url (0.50s)
      Error: Expected error message not found in output
    ✗ FAIL network_error (120.00s)
      Error: Test timed out after 120 seconds
      Error: Teardown failed: busy
    ======================================================================
    Total: 3 | Passed: 1 | Failed: 2
    ======================================================================
    ");
}

#[test]
fn test_json_report_totals() {
    let json: serde_json::Value = serde_json::from_str(&JsonReporter.generate(&batch())).unwrap();
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["failed"], 2);
    assert_eq!(json["summary"]["duration"], 133.0);
    assert_eq!(json["tests"][1]["validations"][0]["validator"], "error_message");
    assert_eq!(json["tests"][1]["validations"][0]["passed"], false);
}

#[test]
fn test_html_report_has_one_card_per_result() {
    let html = HtmlReporter.generate(&batch());
    assert_eq!(html.matches(r#"<div class="test test-"#).count(), 3);
    assert!(html.contains("Duration: <strong>133.00s</strong>"));
    assert!(html.contains("Test timed out after 120 seconds\nTeardown failed: busy"));
}
