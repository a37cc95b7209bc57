use rvd_e2e_validators::{ContentValidator, FileValidator, Verdict};
use tracing::{info, warn};

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{SUCCESS_KEYWORDS, fail, keywords, output_of, unconfigured, video_fallback};

/// Download a video with subtitles and check the SRT/VTT files look like cues.
#[derive(Debug, Clone)]
pub struct SubtitleDownload {
    url: String,
}

impl SubtitleDownload {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_data(data: &TestData, placeholder: &str) -> Self {
        Self::new(data.url_or(placeholder))
    }
}

impl Scenario for SubtitleDownload {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = ctx.base_command();
        cmd.push(self.url.clone());
        cmd.extend(ctx.output_args());
        Ok(cmd)
    }

    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool {
        if unconfigured(&self.url, result) {
            return false;
        }

        if keywords(SUCCESS_KEYWORDS).validate(&output_of(result)).passed {
            result.record("success", Verdict::pass_with("Download completed"));
        } else {
            warn!("no clear success message");
        }

        let srt = FileValidator::new().exists("**/*.srt").validate(&ctx.workdir).passed;
        let vtt = FileValidator::new().exists("**/*.vtt").validate(&ctx.workdir).passed;
        if !srt && !vtt {
            return video_fallback(result, &ctx.workdir, "subtitle");
        }
        info!(srt, vtt, "subtitle files found");

        // Both formats separate cue timestamps with an arrow.
        let pattern = if srt { "**/*.srt" } else { "**/*.vtt" };
        let verdict = ContentValidator::new(pattern).contains("-->").validate(&ctx.workdir);
        let message = verdict.message.clone();
        if result.record("subtitle_content", verdict) {
            true
        } else {
            fail(result, message)
        }
    }
}
