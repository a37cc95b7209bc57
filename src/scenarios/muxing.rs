use rvd_e2e_validators::{FileValidator, Verdict};

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{SUCCESS_KEYWORDS, check_output, fail, keywords};

/// Raw streams left behind by `--skip-mux`.
const STREAM_PATTERNS: &[&str] = &["**/*.m4s", "**/*.mp4"];
const SKIP_MUX_KEYWORDS: &[&str] = &["downloaded", "skipped mux", "跳过混流"];

/// `--skip-mux`: the download succeeds and the separate audio/video streams stay on
/// disk. Stream files are not size-checked.
#[derive(Debug, Clone)]
pub struct SkipMux {
    url: String,
}

impl SkipMux {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_data(data: &TestData, placeholder: &str) -> Self {
        Self::new(data.url_or(placeholder))
    }
}

impl Scenario for SkipMux {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = ctx.base_command();
        cmd.push(self.url.clone());
        cmd.push("--skip-mux".to_string());
        cmd.extend(ctx.output_args());
        Ok(cmd)
    }

    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool {
        let success = keywords(&[SUCCESS_KEYWORDS, SKIP_MUX_KEYWORDS].concat());
        if !check_output(result, "output", &success) {
            return fail(result, "No success message in output");
        }

        let streams = FileValidator::new().require_any(STREAM_PATTERNS.iter().copied());
        if streams.validate(&ctx.workdir).passed {
            result.record("file", Verdict::pass_with("Found video/audio file(s)"));
            true
        } else {
            result.record("file", Verdict::fail("No video/audio files found"));
            fail(result, "No video/audio files found")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_skip_mux_flag_follows_url() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "skip_mux");
        let cmd = SkipMux::new("https://example.test/v").command(&ctx).unwrap();
        assert_eq!(&cmd[1..4], &["https://example.test/v", "--skip-mux", "--output"]);
    }

    #[test]
    fn test_separate_streams_pass() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "skip_mux");
        write(&ctx.workdir, "BV1xx/video.m4s", b"stream");
        let mut r = result_with("Downloaded 2 streams, skipped mux");

        assert!(SkipMux::new("https://example.test/v").validate(&ctx, &mut r));
        assert_eq!(r.validations.len(), 2);
    }

    #[test]
    fn test_no_streams_fail() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "skip_mux");
        let mut r = result_with("跳过混流");

        assert!(!SkipMux::new("https://example.test/v").validate(&ctx, &mut r));
        assert_eq!(r.error, "No video/audio files found");
    }
}
