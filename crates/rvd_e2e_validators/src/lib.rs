//! Validators for the rvd end-to-end harness.
//!
//! A validator is a stateless check that consumes either the captured output of the
//! downloader process or the state of a test's working directory and produces a
//! [`Verdict`]. A mismatch is never an error: it is a normal failing verdict carrying a
//! human-readable reason.
//!
//! ## Variants
//!
//! - [`OutputValidator`] - substring / regex / exit-code checks on stdout + stderr
//! - [`FileValidator`] - glob existence, non-existence and size bounds
//! - [`ContentValidator`] - substring / regex checks on the text of matching files
//!
//! The set is closed, so [`Validator`] is a plain enum rather than a trait object.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod content;
pub mod file;
pub mod output;
mod patterns;

use std::fmt;
use std::path::Path;

pub use content::ContentValidator;
pub use file::FileValidator;
pub use output::{CapturedOutput, OutputValidator};

/// Outcome of a single validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    /// Empty on success, otherwise the first failing check.
    pub message: String,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Passing verdict that still carries an informational message.
    pub fn pass_with(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    pub fn into_parts(self) -> (bool, String) {
        (self.passed, self.message)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.passed, self.message.is_empty()) {
            (true, true) => write!(f, "passed"),
            (true, false) => write!(f, "passed: {}", self.message),
            (false, _) => write!(f, "failed: {}", self.message),
        }
    }
}

/// What a validator is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Captured process output.
    Output(CapturedOutput<'a>),
    /// A working directory to evaluate glob patterns against.
    Dir(&'a Path),
}

/// One of the built-in validators.
#[derive(Debug, Clone)]
pub enum Validator {
    Output(OutputValidator),
    File(FileValidator),
    Content(ContentValidator),
}

impl Validator {
    /// Stable identifier recorded next to each verdict.
    pub fn kind(&self) -> &'static str {
        match self {
            Validator::Output(_) => "output",
            Validator::File(_) => "file",
            Validator::Content(_) => "content",
        }
    }

    pub fn validate(&self, target: Target<'_>) -> Verdict {
        match (self, target) {
            (Validator::Output(v), Target::Output(out)) => v.validate(&out),
            (Validator::File(v), Target::Dir(dir)) => v.validate(dir),
            (Validator::Content(v), Target::Dir(dir)) => v.validate(dir),
            (Validator::Output(_), Target::Dir(dir)) => Verdict::fail(format!(
                "output validator cannot check directory {}",
                dir.display()
            )),
            (v, Target::Output(_)) => Verdict::fail(format!(
                "{} validator needs a working directory, got process output",
                v.kind()
            )),
        }
    }
}

impl From<OutputValidator> for Validator {
    fn from(v: OutputValidator) -> Self {
        Validator::Output(v)
    }
}

impl From<FileValidator> for Validator {
    fn from(v: FileValidator) -> Self {
        Validator::File(v)
    }
}

impl From<ContentValidator> for Validator {
    fn from(v: ContentValidator) -> Self {
        Validator::Content(v)
    }
}
