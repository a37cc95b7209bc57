use rvd_e2e_validators::Verdict;
use tracing::warn;

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{fail, keywords, output_of, unconfigured};

const FAILURE_KEYWORDS: &[&str] = &["error", "failed", "错误", "失败"];
const CHAPTER_KEYWORDS: &[&str] = &["chapter", "章节", "view_point", "timestamp", "时间戳"];

/// Run `--info-only` and expect a clean run. Chapter markers are reported when
/// present; a video without chapters still passes.
#[derive(Debug, Clone)]
pub struct ChapterInfo {
    url: String,
}

impl ChapterInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_data(data: &TestData, placeholder: &str) -> Self {
        Self::new(data.url_or(placeholder))
    }
}

impl Scenario for ChapterInfo {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = ctx.base_command();
        cmd.push(self.url.clone());
        cmd.push("--info-only".to_string());
        Ok(cmd)
    }

    fn validate(&self, _ctx: &CaseContext, result: &mut TestResult) -> bool {
        if unconfigured(&self.url, result) {
            return false;
        }

        if keywords(FAILURE_KEYWORDS).validate(&output_of(result)).passed {
            result.record("execution", Verdict::fail("Command execution failed"));
            return fail(result, "Command execution failed");
        }
        result.record("execution", Verdict::pass_with("Command executed successfully"));

        let message = if keywords(CHAPTER_KEYWORDS).validate(&output_of(result)).passed {
            "Chapter information found"
        } else {
            warn!("no chapter information found, the video may not have chapters");
            "No chapters (video may not have chapter markers)"
        };
        result.record("chapter_info", Verdict::pass_with(message));
        true
    }
}
