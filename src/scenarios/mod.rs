//! Concrete downloader scenarios.
//!
//! Each scenario captures its URL and flags when built and implements
//! [`Scenario`](crate::harness::Scenario). The helpers here are the checks most of
//! them share: success keywords in the output, a sizeable video file, and the
//! "sidecar file or at least the video" fallback used when a video may simply have
//! no danmaku or subtitles. [`Hint`]s cover output the downloader may or may not
//! print (progress, mux notes, chapter metadata) without failing the case.

mod chapters;
mod danmaku;
mod errors;
mod muxing;
mod quality;
mod subtitle;
mod video;

pub use chapters::ChapterInfo;
pub use danmaku::{DanmakuDownload, DanmakuFormat};
pub use errors::{ErrorHandling, ErrorKind};
pub use muxing::SkipMux;
pub use quality::DolbyVision;
pub use subtitle::SubtitleDownload;
pub use video::VideoDownload;

use std::path::Path;

use rvd_e2e_validators::{CapturedOutput, FileValidator, OutputValidator, Verdict};
use tracing::{info, warn};

use crate::harness::TestResult;
use crate::harness::test_data::is_placeholder;

pub const SUCCESS_KEYWORDS: &[&str] = &["completed", "success", "完成", "成功", "muxed to"];
pub const VIDEO_PATTERNS: &[&str] = &["*.mp4", "*.mkv", "*.flv"];
/// Containers a muxed download ends up in.
pub const MUXED_PATTERNS: &[&str] = &["*.mp4", "*.mkv"];
pub const MIN_VIDEO_BYTES: u64 = 100 * 1024;

/// Any video container, each at least [`MIN_VIDEO_BYTES`].
pub fn video_files() -> FileValidator {
    video_files_of(VIDEO_PATTERNS)
}

/// At least one of `patterns`, each match at least [`MIN_VIDEO_BYTES`].
pub fn video_files_of(patterns: &[&str]) -> FileValidator {
    patterns
        .iter()
        .fold(FileValidator::new().require_any(patterns.iter().copied()), |v, p| {
            v.min_size(*p, MIN_VIDEO_BYTES)
        })
}

/// Case-insensitive "any of these keywords" check.
pub fn keywords(words: &[&str]) -> OutputValidator {
    OutputValidator::new().contains_any(words.iter().copied()).ignore_case(true)
}

pub(crate) fn output_of(result: &TestResult) -> CapturedOutput<'_> {
    CapturedOutput::new(&result.output, &result.error, result.exit_code)
}

pub(crate) fn check_output(result: &mut TestResult, label: &str, validator: &OutputValidator) -> bool {
    let verdict = validator.validate(&output_of(result));
    result.record(label, verdict)
}

pub(crate) fn check_dir(result: &mut TestResult, label: &str, validator: &FileValidator, dir: &Path) -> bool {
    result.record(label, validator.validate(dir))
}

/// Record the failure reason as the result's error and return `false`.
pub(crate) fn fail(result: &mut TestResult, message: impl Into<String>) -> bool {
    result.error = message.into();
    false
}

/// `true` (and the result marked) when `url` was never configured.
pub(crate) fn unconfigured(url: &str, result: &mut TestResult) -> bool {
    if is_placeholder(url) {
        warn!(url, "URL is a placeholder, skipping validation");
        result.error = "URL not configured".to_string();
        return true;
    }
    false
}

/// A video without the sidecar still counts: not every video has danmaku or subtitles.
pub(crate) fn video_fallback(result: &mut TestResult, workdir: &Path, what: &str) -> bool {
    warn!("no {} file found, the video may not have any", what);
    let verdict = video_files().validate(workdir);
    let passed = verdict.passed;
    let message = if passed {
        format!("No {} available; video downloaded", what)
    } else {
        verdict.message
    };
    result.record("video", Verdict { passed, message });
    if passed {
        info!("video downloaded, no {} available", what);
        true
    } else {
        fail(result, format!("Neither {} nor video file found", what))
    }
}

/// Informational check. Recorded when it holds; when it does not, it is only
/// logged unless [`or_fail`](Hint::or_fail) or [`or_note`](Hint::or_note) asks for a
/// record. Either way the case's verdict is untouched.
#[derive(Debug, Clone)]
pub struct Hint {
    label: &'static str,
    evidence: Evidence,
    found: String,
    missing: Missing,
}

#[derive(Debug, Clone)]
enum Evidence {
    /// Any of these keywords, case-insensitive, in stdout or stderr.
    Output(Vec<String>),
    /// Any of these patterns in the working directory.
    Files(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
enum Missing {
    Warn,
    Record { passed: bool, message: &'static str },
}

impl Hint {
    pub fn output<I, S>(label: &'static str, words: I, found: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label,
            evidence: Evidence::Output(words.into_iter().map(Into::into).collect()),
            found: found.into(),
            missing: Missing::Warn,
        }
    }

    pub fn files(label: &'static str, patterns: &'static [&'static str], found: impl Into<String>) -> Self {
        Self {
            label,
            evidence: Evidence::Files(patterns),
            found: found.into(),
            missing: Missing::Warn,
        }
    }

    /// Record a failed check when missing.
    pub fn or_fail(mut self, message: &'static str) -> Self {
        self.missing = Missing::Record { passed: false, message };
        self
    }

    /// Record a passed check carrying `message` when missing.
    pub fn or_note(mut self, message: &'static str) -> Self {
        self.missing = Missing::Record { passed: true, message };
        self
    }

    pub(crate) fn inspects_files(&self) -> bool {
        matches!(self.evidence, Evidence::Files(_))
    }

    /// Whether the hint held.
    pub(crate) fn check(&self, result: &mut TestResult, workdir: &Path) -> bool {
        let held = match &self.evidence {
            Evidence::Output(words) => keywords_of(words).validate(&output_of(result)).passed,
            Evidence::Files(patterns) => FileValidator::new()
                .require_any(patterns.iter().copied())
                .validate(workdir)
                .passed,
        };
        if held {
            result.record(self.label, Verdict::pass_with(self.found.clone()));
            return true;
        }
        match self.missing {
            Missing::Warn => warn!(check = self.label, "not found, the downloader may not report it"),
            Missing::Record { passed, message } => {
                warn!(check = self.label, "{}", message);
                result.record(self.label, Verdict { passed, message: message.to_string() });
            }
        }
        false
    }
}

fn keywords_of(words: &[String]) -> OutputValidator {
    OutputValidator::new().contains_any(words.iter().cloned()).ignore_case(true)
}
