use rvd_e2e_validators::{OutputValidator, Verdict};
use tracing::{info, warn};

use crate::harness::{CaseContext, CaseError, Scenario, TestResult};

use super::{SUCCESS_KEYWORDS, check_output, fail, keywords, output_of, video_files};

pub const INVALID_URL: &str = "https://invalid-url-that-does-not-exist.com/video/12345";
pub const UNREACHABLE_URL: &str = "https://this-domain-definitely-does-not-exist-12345.com/video";
/// An output path no process can create.
pub const UNWRITABLE_OUTPUT: &str = "/dev/null/invalid_path";

const ERROR_KEYWORDS: &[&str] = &["error", "invalid", "failed", "not found", "错误", "无效", "失败"];
const NETWORK_KEYWORDS: &[&str] = &[
    "network",
    "connection",
    "timeout",
    "dns",
    "resolve",
    "网络",
    "连接",
    "超时",
    "域名",
];
const DISK_KEYWORDS: &[&str] = &[
    "disk",
    "space",
    "write",
    "permission",
    "denied",
    "cannot create",
    "磁盘",
    "空间",
    "写入",
    "权限",
    "拒绝",
    "无法创建",
];
const FFMPEG_MISSING_KEYWORDS: &[&str] = &[
    "ffmpeg not found",
    "ffmpeg is not available",
    "cannot find ffmpeg",
    "ffmpeg 未找到",
    "ffmpeg 不可用",
    "找不到 ffmpeg",
];
const AUTH_KEYWORDS: &[&str] = &[
    "auth",
    "login",
    "credential",
    "permission",
    "forbidden",
    "403",
    "认证",
    "登录",
    "权限",
    "禁止",
    "vip",
    "大会员",
];
const GENERIC_ERROR_KEYWORDS: &[&str] = &["error", "failed", "错误", "失败"];
const CRASH_KEYWORDS: &[&str] = &["panic", "segmentation fault", "core dumped", "fatal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A URL no extractor understands.
    InvalidUrl,
    /// A host that does not resolve.
    Network,
    /// Output written to [`UNWRITABLE_OUTPUT`].
    DiskSpace,
    /// A download that needs FFmpeg. Passes whether or not FFmpeg is installed, as
    /// long as nothing crashes.
    MissingFfmpeg,
    /// Content behind a login. With a credential file configured the download must
    /// succeed; without one, the downloader must say why it stopped.
    AuthRequired,
}

/// Feed the downloader a bad input and expect a clear error instead of a crash.
///
/// The exit code is deliberately not checked; only the wording matters.
#[derive(Debug, Clone)]
pub struct ErrorHandling {
    kind: ErrorKind,
    url: String,
}

impl ErrorHandling {
    /// Uses the kind's built-in URL; kinds that need a real video get a placeholder.
    pub fn new(kind: ErrorKind) -> Self {
        let url = match kind {
            ErrorKind::InvalidUrl => INVALID_URL,
            ErrorKind::Network => UNREACHABLE_URL,
            ErrorKind::DiskSpace | ErrorKind::MissingFfmpeg => "PLACEHOLDER_VIDEO_URL",
            ErrorKind::AuthRequired => "PLACEHOLDER_AUTH_REQUIRED_URL",
        };
        Self::with_url(kind, url)
    }

    pub fn with_url(kind: ErrorKind, url: impl Into<String>) -> Self {
        Self { kind, url: url.into() }
    }

    fn no_crash() -> OutputValidator {
        CRASH_KEYWORDS
            .iter()
            .fold(OutputValidator::new().ignore_case(true), |v, k| v.not_contains(*k))
    }

    /// `Some(passed)` when the verdict is settled before the crash check.
    fn settle(&self, ctx: &CaseContext, result: &mut TestResult) -> Option<bool> {
        let reported = match self.kind {
            ErrorKind::InvalidUrl => check_output(result, "error_message", &keywords(ERROR_KEYWORDS)),
            ErrorKind::Network => {
                // Any error wording is acceptable when the network failure is not named.
                let network = keywords(NETWORK_KEYWORDS).validate(&output_of(result)).passed;
                network || check_output(result, "error_message", &keywords(GENERIC_ERROR_KEYWORDS))
            }
            ErrorKind::DiskSpace => {
                if keywords(DISK_KEYWORDS).validate(&output_of(result)).passed {
                    result.record("disk_error", Verdict::pass_with("Disk/write error detected"))
                } else {
                    let generic = check_output(result, "disk_error", &keywords(GENERIC_ERROR_KEYWORDS));
                    if generic {
                        warn!("got an error, but not about disk space");
                    }
                    generic
                }
            }
            ErrorKind::MissingFfmpeg => {
                record_ffmpeg_status(result);
                true
            }
            ErrorKind::AuthRequired if ctx.requires_auth => return Some(authenticated_download(ctx, result)),
            ErrorKind::AuthRequired => return Some(auth_refusal(result)),
        };
        if reported {
            None
        } else {
            Some(fail(result, "Expected error message not found in output"))
        }
    }
}

fn record_ffmpeg_status(result: &mut TestResult) {
    let output = output_of(result);
    let mentions_ffmpeg = OutputValidator::new().contains("ffmpeg").ignore_case(true).validate(&output).passed;
    let (label, message) = if mentions_ffmpeg {
        if keywords(FFMPEG_MISSING_KEYWORDS).validate(&output).passed {
            ("ffmpeg_error", "FFmpeg error detected")
        } else {
            ("ffmpeg_available", "FFmpeg appears to be available")
        }
    } else if keywords(SUCCESS_KEYWORDS).validate(&output).passed {
        ("success", "Download completed successfully")
    } else {
        warn!("cannot tell FFmpeg status from the output");
        ("unknown", "Test scenario unclear")
    };
    info!(status = label, "FFmpeg check");
    result.record(label, Verdict::pass_with(message));
}

fn auth_refusal(result: &mut TestResult) -> bool {
    if keywords(AUTH_KEYWORDS).validate(&output_of(result)).passed {
        result.record("auth_error", Verdict::pass_with("Authentication error detected"))
    } else if keywords(GENERIC_ERROR_KEYWORDS).validate(&output_of(result)).passed {
        warn!("got an error, but not about authentication");
        result.record("generic_error", Verdict::pass_with("Generic error detected"))
    } else {
        result.record("auth_error", Verdict::fail("No error message found"));
        fail(result, "Expected authentication error not found")
    }
}

fn authenticated_download(ctx: &CaseContext, result: &mut TestResult) -> bool {
    if !keywords(SUCCESS_KEYWORDS).validate(&output_of(result)).passed {
        result.record("auth_success", Verdict::fail("Failed with authentication"));
        return fail(result, "Failed to download even with authentication");
    }
    let files = video_files().validate(&ctx.workdir);
    if !files.passed {
        result.record("file", files);
        return fail(result, "No video files found despite success message");
    }
    result.record("auth_success", Verdict::pass_with("Downloaded with authentication"))
}

impl Scenario for ErrorHandling {
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
        let mut cmd = ctx.base_command();
        cmd.push(self.url.clone());
        match self.kind {
            ErrorKind::DiskSpace => cmd.extend(["--output".to_string(), UNWRITABLE_OUTPUT.to_string()]),
            _ => cmd.extend(ctx.output_args()),
        }
        Ok(cmd)
    }

    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool {
        if let Some(passed) = self.settle(ctx, result) {
            return passed;
        }
        if !check_output(result, "no_crash", &Self::no_crash()) {
            return fail(result, "Program crashed instead of handling error gracefully");
        }
        true
    }
}
