use std::path::PathBuf;

use rvd_e2e_validators::FileValidator;
use tracing::warn;

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{
    Hint, SUCCESS_KEYWORDS, VIDEO_PATTERNS, check_dir, check_output, fail, keywords, unconfigured, video_files_of,
};

/// Download one URL and expect a success message plus a video file.
///
/// Covers plain, multi-part, bangumi, batch, quality, codec, mux and HTTP client
/// downloads. They differ in the flags around the URL, the accepted containers and
/// the [`Hint`]s checked along the way.
///
/// The command is `HEAD [--config-file F] LEADING.. URL EXTRA.. --output WORKDIR`,
/// where `HEAD` is the context's base command or just the executable.
#[derive(Debug, Clone)]
pub struct VideoDownload {
    url: String,
    leading_args: Vec<String>,
    extra_args: Vec<String>,
    inherit_base: bool,
    config_file: Option<PathBuf>,
    containers: &'static [&'static str],
    hints: Vec<Hint>,
    leftovers: &'static [&'static str],
}

impl VideoDownload {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            leading_args: Vec::new(),
            extra_args: Vec::new(),
            inherit_base: true,
            config_file: None,
            containers: VIDEO_PATTERNS,
            hints: Vec::new(),
            leftovers: &[],
        }
    }

    pub fn from_data(data: &TestData, placeholder: &str) -> Self {
        Self::new(data.url_or(placeholder))
    }

    /// Argument placed after the URL.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Argument placed before the URL.
    pub fn leading_arg(mut self, arg: impl Into<String>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// `--batch-limit N`.
    pub fn batch_limit(self, limit: u64) -> Self {
        self.arg("--batch-limit").arg(limit.to_string())
    }

    /// `--codec LIST`, e.g. `hevc,avc,av1`.
    pub fn codec(self, codecs: impl Into<String>) -> Self {
        self.arg("--codec").arg(codecs)
    }

    /// Start from the bare executable: no credential file, no quality.
    pub fn without_base_command(mut self) -> Self {
        self.inherit_base = false;
        self
    }

    /// Pass `--config-file PATH` when the file exists at command time; otherwise
    /// warn and let the downloader fall back to its defaults.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Accepted video containers; defaults to [`VIDEO_PATTERNS`].
    pub fn containers(mut self, patterns: &'static [&'static str]) -> Self {
        self.containers = patterns;
        self
    }

    pub fn hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Fail when any of `patterns` is still present after the download.
    pub fn forbid_leftovers(mut self, patterns: &'static [&'static str]) -> Self {
        self.leftovers = patterns;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Scenario for VideoDownload {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = if self.inherit_base {
            ctx.base_command()
        } else {
            vec![ctx.executable().to_string_lossy().into_owned()]
        };
        if let Some(path) = &self.config_file {
            if path.is_file() {
                cmd.push("--config-file".to_string());
                cmd.push(path.to_string_lossy().into_owned());
            } else {
                warn!(path = %path.display(), "downloader config file not found, using defaults");
            }
        }
        cmd.extend(self.leading_args.iter().cloned());
        cmd.push(self.url.clone());
        cmd.extend(self.extra_args.iter().cloned());
        cmd.extend(ctx.output_args());
        Ok(cmd)
    }

    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool {
        if unconfigured(&self.url, result) {
            return false;
        }
        for hint in self.hints.iter().filter(|h| !h.inspects_files()) {
            hint.check(result, &ctx.workdir);
        }
        if !check_output(result, "output", &keywords(SUCCESS_KEYWORDS)) {
            return fail(result, "No success message in output");
        }
        if !check_dir(result, "file", &video_files_of(self.containers), &ctx.workdir) {
            let message = result.validations.last().map(|v| v.message.clone()).unwrap_or_default();
            return fail(result, message);
        }
        if !self.leftovers.is_empty() {
            let clean = self.leftovers.iter().fold(FileValidator::new(), |v, p| v.not_exists(*p));
            if !check_dir(result, "temp_cleanup", &clean, &ctx.workdir) {
                let message = result.validations.last().map(|v| v.message.clone()).unwrap_or_default();
                return fail(result, format!("Temporary files not cleaned up: {}", message));
            }
        }
        for hint in self.hints.iter().filter(|h| h.inspects_files()) {
            hint.check(result, &ctx.workdir);
        }
        true
    }
}
