use chrono::Local;
use serde::Serialize;
use tracing::error;

use super::{Reporter, Summary};
use crate::harness::TestResult;

/// Machine-readable report; see [`Report`] for the layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

#[derive(Serialize)]
struct Report<'a> {
    timestamp: String,
    summary: Summary,
    tests: &'a [TestResult],
}

impl Reporter for JsonReporter {
    fn generate(&self, results: &[TestResult]) -> String {
        let report = Report {
            timestamp: Local::now().to_rfc3339(),
            summary: Summary::of(results),
            tests: results,
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            error!("failed to serialize report: {}", e);
            String::from("{}")
        })
    }
}
