//! The outcome record produced by every test case.

use std::path::PathBuf;
use std::time::Duration;

use rvd_e2e_validators::Verdict;
use serde::{Serialize, Serializer};

/// One recorded validator outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub validator: String,
    pub passed: bool,
    pub message: String,
}

/// Result of running one test case.
///
/// `output` and `error` default to empty strings, never absent, so reporters and
/// validators can search them without special-casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub output: String,
    pub error: String,
    /// `None` when the process never ran, timed out or died from a signal.
    pub exit_code: Option<i32>,
    /// Regular files under the workdir at collection time, absolute and sorted.
    pub artifacts: Vec<PathBuf>,
    pub validations: Vec<ValidationRecord>,
}

impl TestResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            duration: Duration::ZERO,
            output: String::new(),
            error: String::new(),
            exit_code: None,
            artifacts: Vec::new(),
            validations: Vec::new(),
        }
    }

    /// Failing result for a case that never produced one of its own.
    pub fn synthesized_failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::new(name)
        }
    }

    /// Append a validator outcome and return whether it passed.
    pub fn record(&mut self, validator: &str, verdict: Verdict) -> bool {
        let (passed, message) = verdict.into_parts();
        self.validations.push(ValidationRecord {
            validator: validator.to_string(),
            passed,
            message,
        });
        passed
    }

    /// Append `message` to `error` on a new line.
    pub fn append_error(&mut self, message: &str) {
        if !self.error.is_empty() {
            self.error.push('\n');
        }
        self.error.push_str(message);
    }

    /// Messages of every failed validation, in recording order.
    pub fn failed_validations(&self) -> impl Iterator<Item = &str> {
        self.validations.iter().filter(|v| !v.passed).map(|v| v.message.as_str())
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}
