use std::fmt::Write;

use chrono::Local;

use super::{Reporter, Summary};
use crate::harness::TestResult;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 20px;
                     border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        h1 { color: #333; border-bottom: 2px solid #4CAF50; padding-bottom: 10px; }
        .summary { background: #f0f0f0; padding: 15px; border-radius: 5px; margin: 20px 0; }
        .summary-item { display: inline-block; margin-right: 30px; font-size: 16px; }
        .pass { color: #4CAF50; font-weight: bold; }
        .fail { color: #f44336; font-weight: bold; }
        .test { margin: 15px 0; padding: 15px; border: 1px solid #ddd; border-radius: 5px;
                background-color: #fafafa; }
        .test-header { font-weight: bold; font-size: 16px; margin-bottom: 10px; }
        .test-pass { border-left: 4px solid #4CAF50; }
        .test-fail { border-left: 4px solid #f44336; }
        .error { background: #ffe0e0; padding: 10px; margin-top: 10px; border-radius: 3px;
                 font-family: monospace; font-size: 12px; white-space: pre-wrap; word-wrap: break-word; }
        .timestamp { color: #666; font-size: 14px; margin-top: 20px; }
"#;

/// Self-contained HTML page, one card per result.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReporter;

impl Reporter for HtmlReporter {
    fn generate(&self, results: &[TestResult]) -> String {
        let summary = Summary::of(results);
        let mut html = String::new();

        // Writing into a String cannot fail.
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>E2E Test Report</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="container">
        <h1>E2E Test Report</h1>
        <div class="summary">
            <div class="summary-item">Total: <strong>{}</strong></div>
            <div class="summary-item"><span class="pass">Passed: {}</span></div>
            <div class="summary-item"><span class="fail">Failed: {}</span></div>
            <div class="summary-item">Duration: <strong>{:.2}s</strong></div>
        </div>
        <div class="tests">
"#,
            summary.total, summary.passed, summary.failed, summary.duration
        );

        for result in results {
            let (card, color, status) = if result.passed {
                ("test-pass", "pass", "✓ PASS")
            } else {
                ("test-fail", "fail", "✗ FAIL")
            };
            let _ = write!(
                html,
                r#"            <div class="test {card}">
                <div class="test-header">
                    <span class="{color}">{status}</span> {}
                    <span style="color: #666;">({:.2}s)</span>
                </div>
"#,
                escape(&result.name),
                result.duration.as_secs_f64()
            );
            if !result.passed && !result.error.is_empty() {
                let _ = writeln!(html, r#"                <div class="error">{}</div>"#, escape(&result.error));
            }
            html.push_str("            </div>\n");
        }

        let _ = write!(
            html,
            r#"        </div>
        <div class="timestamp">Generated at: {}</div>
    </div>
</body>
</html>
"#,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        html
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
