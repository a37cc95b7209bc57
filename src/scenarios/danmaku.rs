use rvd_e2e_validators::{ContentValidator, FileValidator, Verdict};
use tracing::info;

use crate::harness::{CaseContext, CaseError, Scenario, TestData, TestResult};

use super::{check_dir, fail, keywords, output_of, unconfigured, video_fallback};

const MIN_DANMAKU_BYTES: u64 = 100;
const DECOMPRESS_KEYWORDS: &[&str] = &["decompress", "inflate", "gzip", "deflate", "解压", "压缩"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanmakuFormat {
    Xml,
    Ass,
}

impl DanmakuFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DanmakuFormat::Xml => "xml",
            DanmakuFormat::Ass => "ass",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DanmakuFormat::Xml => "*.xml",
            DanmakuFormat::Ass => "*.ass",
        }
    }

    fn markers(self) -> &'static [&'static str] {
        match self {
            DanmakuFormat::Xml => &["<?xml", "<d ", "</d>"],
            DanmakuFormat::Ass => &["[Script Info]", "[Events]", "Dialogue:"],
        }
    }
}

/// Download a video with its danmaku (bullet comments) and check the danmaku file.
#[derive(Debug, Clone)]
pub struct DanmakuDownload {
    url: String,
    format: DanmakuFormat,
    /// Only look for readable XML; a compressed payload that was not inflated fails.
    decompression: bool,
}

impl DanmakuDownload {
    pub fn new(url: impl Into<String>, format: DanmakuFormat) -> Self {
        Self {
            url: url.into(),
            format,
            decompression: false,
        }
    }

    pub fn from_data(data: &TestData, format: DanmakuFormat) -> Self {
        Self::new(data.url_or("PLACEHOLDER_VIDEO_URL"), format)
    }

    /// Variant that checks the downloader inflated the compressed danmaku stream.
    pub fn decompression(url: impl Into<String>) -> Self {
        Self {
            decompression: true,
            ..Self::new(url, DanmakuFormat::Xml)
        }
    }

    fn content_check(&self) -> ContentValidator {
        let markers: &[&str] = if self.decompression {
            &["<?xml", "<d "]
        } else {
            self.format.markers()
        };
        markers
            .iter()
            .fold(ContentValidator::new(self.format.pattern()), |v, m| v.contains(*m))
    }
}

impl Scenario for DanmakuDownload {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = ctx.base_command();
        cmd.extend([
            self.url.clone(),
            "--download-danmaku".to_string(),
            "--danmaku-format".to_string(),
            self.format.as_str().to_string(),
        ]);
        cmd.extend(ctx.output_args());
        Ok(cmd)
    }

    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool {
        if unconfigured(&self.url, result) {
            return false;
        }

        // Informational only; the files decide.
        if self.decompression {
            let verdict = keywords(DECOMPRESS_KEYWORDS).validate(&output_of(result));
            if verdict.passed {
                info!("decompression reported in output");
                result.record("decompress_info", Verdict::pass_with("Decompression information found"));
            }
        }

        let pattern = self.format.pattern();
        let files = FileValidator::new().exists(pattern).min_size(pattern, MIN_DANMAKU_BYTES);
        if !check_dir(result, "file", &files, &ctx.workdir) {
            return video_fallback(result, &ctx.workdir, "danmaku");
        }

        let verdict = self.content_check().validate(&ctx.workdir);
        let message = verdict.message.clone();
        if result.record("content", verdict) {
            return true;
        }
        if self.decompression {
            fail(
                result,
                "Danmaku file exists but content is not valid XML (decompression may have failed)",
            )
        } else {
            fail(result, message)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    const XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><i><chatserver>chat.bilibili.com</chatserver>\
        <d p=\"0.0,1,25,16777215,0,0,0,0\">first</d><d p=\"1.5,1,25,16777215,0,0,0,0\">second</d></i>";

    #[test]
    fn test_command_flags() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "ass_danmaku");
        let cmd = DanmakuDownload::new("https://example.test/v", DanmakuFormat::Ass)
            .command(&ctx)
            .unwrap();
        assert_eq!(&cmd[1..5], &["https://example.test/v", "--download-danmaku", "--danmaku-format", "ass"]);
        assert_eq!(cmd[5], "--output");
    }

    #[test]
    fn test_xml_danmaku_passes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "xml_danmaku");
        write(&ctx.workdir, "video.xml", XML.as_bytes());
        let mut r = result_with("danmaku saved");

        assert!(DanmakuDownload::new("https://example.test/v", DanmakuFormat::Xml).validate(&ctx, &mut r));
        let kinds: Vec<_> = r.validations.iter().map(|v| v.validator.as_str()).collect();
        assert_eq!(kinds, vec!["file", "content"]);
    }

    #[test]
    fn test_malformed_ass_fails_with_content_message() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "ass_danmaku");
        write(&ctx.workdir, "video.ass", &[b'x'; 200]);
        let mut r = result_with("");

        assert!(!DanmakuDownload::new("https://example.test/v", DanmakuFormat::Ass).validate(&ctx, &mut r));
        assert_eq!(r.error, "File video.ass does not contain: [Script Info]");
    }

    #[test]
    fn test_no_danmaku_falls_back_to_video() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "xml_danmaku");
        video(&ctx.workdir);
        let mut r = result_with("completed");

        assert!(DanmakuDownload::new("https://example.test/v", DanmakuFormat::Xml).validate(&ctx, &mut r));
        assert!(!r.validations[0].passed);
        assert_eq!(r.validations[1].validator, "video");
    }

    #[test]
    fn test_decompression_failure_message() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "danmaku_decompression");
        write(&ctx.workdir, "video.xml", &[0x78, 0x9c].repeat(80));
        let mut r = result_with("inflate stream");

        assert!(!DanmakuDownload::decompression("https://example.test/v").validate(&ctx, &mut r));
        assert!(r.error.contains("decompression may have failed"));
        assert_eq!(r.validations[0].validator, "decompress_info");
    }
}
