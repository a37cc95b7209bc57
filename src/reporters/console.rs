use std::fs;

use super::{Reporter, Summary};
use crate::harness::TestResult;
use crate::harness::workdir::format_size;

const RULE_WIDTH: usize = 70;
const MAX_ERROR_LINES: usize = 5;

/// Plain-text summary for the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    pub color: bool,
    /// List each result's artifacts with their sizes.
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool, verbose: bool) -> Self {
        Self { color, verbose }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }
}

impl Reporter for ConsoleReporter {
    fn generate(&self, results: &[TestResult]) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = vec![String::new(), rule.clone(), "TEST RESULTS".to_string(), rule.clone()];

        for result in results {
            let status = if result.passed {
                self.green("✓ PASS")
            } else {
                self.red("✗ FAIL")
            };
            out.push(format!("{} {} ({:.2}s)", status, result.name, result.duration.as_secs_f64()));

            if !result.passed {
                for line in result.error.lines().take(MAX_ERROR_LINES) {
                    if !line.trim().is_empty() {
                        out.push(format!("  {}", self.red(&format!("Error: {}", line))));
                    }
                }
            }

            if self.verbose {
                for artifact in &result.artifacts {
                    let size = fs::metadata(artifact).map(|m| format_size(m.len())).unwrap_or_default();
                    out.push(format!("  Artifact: {} ({})", artifact.display(), size));
                }
            }
        }

        let summary = Summary::of(results);
        out.push(rule.clone());
        out.push(format!(
            "Total: {} | Passed: {} | Failed: {}",
            summary.total,
            self.green(&summary.passed.to_string()),
            self.red(&summary.failed.to_string())
        ));
        out.push(rule);
        out.join("\n")
    }
}
