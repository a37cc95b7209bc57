use rvd_e2e_validators::Verdict;
use tracing::info;

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{
    Hint, MUXED_PATTERNS, SUCCESS_KEYWORDS, check_dir, fail, keywords, output_of, unconfigured, video_files_of,
};

const DOLBY_KEYWORDS: &[&str] = &["dolby", "杜比", "vision", "视界", "ffmpeg", "126"];
/// What the downloader prints when the local FFmpeg is too old for Dolby Vision.
const FFMPEG_WARNING_KEYWORDS: &[&str] = &["warning", "ffmpeg version", "upgrade", "警告", "版本", "升级"];

/// Dolby Vision download. Either the download completes with a muxed video, or
/// the downloader warns that FFmpeg cannot handle it; both pass.
#[derive(Debug, Clone)]
pub struct DolbyVision {
    url: String,
}

impl DolbyVision {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_data(data: &TestData, placeholder: &str) -> Self {
        Self::new(data.url_or(placeholder))
    }
}

impl Scenario for DolbyVision {
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
        Hint::output("dolby_info", DOLBY_KEYWORDS.iter().copied(), "Dolby Vision information found")
            .check(result, &ctx.workdir);

        let output = output_of(result);
        let succeeded = keywords(SUCCESS_KEYWORDS).validate(&output).passed;
        let warned = keywords(FFMPEG_WARNING_KEYWORDS).validate(&output).passed;

        if succeeded {
            result.record("success", Verdict::pass_with("Download completed"));
            if !check_dir(result, "file", &video_files_of(MUXED_PATTERNS), &ctx.workdir) {
                let message = result.validations.last().map(|v| v.message.clone()).unwrap_or_default();
                return fail(result, message);
            }
            true
        } else if warned {
            info!("FFmpeg may be too old for Dolby Vision");
            result.record("warning", Verdict::pass_with("FFmpeg version warning detected"))
        } else {
            result.record("result", Verdict::fail("No clear result"));
            fail(result, "No success or warning message found")
        }
    }
}
