//! Report generation.
//!
//! A [`Reporter`] turns a finished batch of [`TestResult`]s into one document.
//! Reporters never print or write files themselves; the CLI decides where each
//! report goes.

mod console;
mod html;
mod json;

pub use console::ConsoleReporter;
pub use html::HtmlReporter;
pub use json::JsonReporter;

use std::time::Duration;

use serde::Serialize;

use crate::harness::TestResult;

pub trait Reporter {
    fn generate(&self, results: &[TestResult]) -> String;
}

/// Totals shared by every report format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Sum of the case durations, in seconds.
    pub duration: f64,
}

impl Summary {
    pub fn of(results: &[TestResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let duration: Duration = results.iter().map(|r| r.duration).sum();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration: duration.as_secs_f64(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
