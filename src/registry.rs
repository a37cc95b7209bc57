//! Static test-case registry and suites.
//!
//! Every case the tool knows about is a [`CaseEntry`] in [`ENTRIES`]. An entry is
//! plain data plus a factory that builds the runnable [`TestCase`] from the loaded
//! configuration, so nothing is discovered by name at runtime.
//!
//! Entry ids double as working-directory names and are unique.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::harness::{CaseContext, CaseError, TestCase, TestData};
use crate::scenarios::{
    ChapterInfo, DanmakuDownload, DanmakuFormat, DolbyVision, ErrorHandling, ErrorKind, Hint, MUXED_PATTERNS, SkipMux,
    SubtitleDownload, VideoDownload,
};

/// Downloader config file used when neither the case nor the harness names one.
pub const DEFAULT_DOWNLOADER_CONFIG: &str = "./cfg/rvd.toml";

const PROGRESS_KEYWORDS: &[&str] = &["progress", "进度", "%", "downloading", "下载中", "mb/s", "kb/s"];
const MUX_KEYWORDS: &[&str] = &["mux", "混流", "ffmpeg", "merging", "合并"];
const CHAPTER_KEYWORDS: &[&str] = &["chapter", "章节", "metadata", "元数据"];
const TEMP_PATTERNS: &[&str] = &["**/*.tmp", "**/*.part", "**/*.downloading", "**/temp_*"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Test not found: {0}")]
    UnknownCase(String),

    #[error("Test {id} is disabled: {reason}")]
    Disabled { id: String, reason: String },

    #[error("Failed to build {id}: {source}")]
    Build {
        id: String,
        #[source]
        source: CaseError,
    },
}

pub type Factory = fn(&Config) -> Result<TestCase, RegistryError>;

/// One registered test case.
#[derive(Debug, Clone, Copy)]
pub struct CaseEntry {
    pub id: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub enabled: bool,
    /// Why a disabled entry is disabled.
    pub reason: Option<&'static str>,
    pub factory: Factory,
}

impl CaseEntry {
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(&t.as_str()))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SuiteCases {
    Listed(&'static [&'static str]),
    /// Every enabled entry, in registry order.
    AllEnabled,
}

#[derive(Debug, Clone, Copy)]
pub struct Suite {
    pub name: &'static str,
    pub description: &'static str,
    pub cases: SuiteCases,
}

// ============================================================================
// Entries
// ============================================================================

pub static ENTRIES: &[CaseEntry] = &[
    // core: configuration
    CaseEntry {
        id: "default_config",
        category: "core",
        description: "Built-in defaults without a config file",
        tags: &["core", "config", "basic"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("default_config", config, "core.config.default", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL").without_base_command();
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "custom_config",
        category: "core",
        description: "Custom downloader config file",
        tags: &["core", "config"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("custom_config", config, "core.config.custom", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .without_base_command()
                .config_file(downloader_config(&data, config));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "cli_priority",
        category: "core",
        description: "CLI flags override the config file",
        tags: &["core", "config", "priority"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("cli_priority", config, "core.config.custom", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .without_base_command()
                .config_file(downloader_config(&data, config))
                .leading_arg("--quality")
                .leading_arg("480P")
                .hint(Hint::output("quality", ["480"], "CLI quality parameter applied"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // core: downloader
    CaseEntry {
        id: "builtin_downloader",
        category: "core",
        description: "Built-in multi-threaded downloader",
        tags: &["core", "download", "basic"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("builtin_downloader", config, "core.downloader.builtin", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "download_progress",
        category: "core",
        description: "Download progress reporting",
        tags: &["core", "download", "progress"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("download_progress", config, "core.downloader.builtin", Some(600))?;
            let progress = Hint::output("progress", PROGRESS_KEYWORDS.iter().copied(), "Progress information found")
                .or_fail("No progress information found");
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL").hint(progress);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // core: muxer
    CaseEntry {
        id: "basic_mux",
        category: "core",
        description: "Audio and video muxed into one file",
        tags: &["core", "mux", "basic"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("basic_mux", config, "core.muxer.basic", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .containers(MUXED_PATTERNS)
                .hint(Hint::output("mux_info", MUX_KEYWORDS.iter().copied(), "Mux information found"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "subtitle_embed",
        category: "core",
        description: "Subtitles embedded while muxing",
        tags: &["core", "mux", "subtitle"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("subtitle_embed", config, "core.muxer.with_subtitle", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .containers(MUXED_PATTERNS)
                .hint(Hint::files("subtitle", &["**/*.srt", "**/*.vtt"], "Found subtitle file(s)"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "chapter_embed",
        category: "core",
        description: "Chapter metadata embedded while muxing",
        tags: &["core", "mux", "chapters"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("chapter_embed", config, "core.muxer.basic", Some(600))?;
            let chapters = Hint::output("chapter_info", ["chapter", "章节", "metadata"], "Chapter information found");
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .containers(MUXED_PATTERNS)
                .hint(chapters);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "skip_mux",
        category: "core",
        description: "--skip-mux keeps the separate streams",
        tags: &["core", "mux", "skip"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("skip_mux", config, "core.muxer.skip_mux", Some(600))?;
            Ok(TestCase::new(ctx, SkipMux::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    // core: HTTP client
    CaseEntry {
        id: "default_user_agent",
        category: "core",
        description: "Default User-Agent",
        tags: &["core", "http"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("default_user_agent", config, "core.http_client.default_user_agent", Some(600))?;
            let mut scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .hint(Hint::output("user_agent", ["user-agent", "user_agent"], "User-Agent found in output"));
            if data.get_bool("log_user_agent").unwrap_or(true) {
                scenario = scenario.leading_arg("--verbose");
            }
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "custom_user_agent_cli",
        category: "core",
        description: "User-Agent given with --user-agent",
        tags: &["core", "http", "cli"],
        enabled: true,
        reason: None,
        factory: |config| {
            let key = "core.http_client.custom_user_agent";
            let (ctx, data) = prepare("custom_user_agent_cli", config, key, Some(600))?;
            let agent = data
                .get_str("user_agent")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "CustomBot/1.0".to_string());
            let found = format!("Custom User-Agent found: {}", agent);
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .leading_arg("--user-agent")
                .leading_arg(agent.clone())
                .leading_arg("--verbose")
                .hint(Hint::output("custom_user_agent", [agent], found));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // core: error handling
    CaseEntry {
        id: "invalid_url",
        category: "core",
        description: "Invalid URL is reported as an error",
        tags: &["core", "error", "validation"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, _) = prepare("invalid_url", config, "", Some(60))?;
            Ok(TestCase::new(ctx, ErrorHandling::new(ErrorKind::InvalidUrl)))
        },
    },
    CaseEntry {
        id: "network_error",
        category: "core",
        description: "Unreachable host is reported as an error",
        tags: &["core", "error", "network"],
        enabled: true,
        reason: None,
        factory: |config| {
            // Leaves room for the downloader's retries.
            let (ctx, _) = prepare("network_error", config, "", Some(120))?;
            Ok(TestCase::new(ctx, ErrorHandling::new(ErrorKind::Network)))
        },
    },
    // core: pending
    CaseEntry {
        id: "aria2c_downloader",
        category: "core",
        description: "aria2c external downloader",
        tags: &["core", "download", "aria2c"],
        enabled: false,
        reason: Some("aria2c integration pending; requires aria2c installed"),
        factory: |config| {
            let (ctx, data) = prepare("aria2c_downloader", config, "core.downloader.aria2c", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL").arg("--use-aria2c");
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "custom_user_agent_config",
        category: "core",
        description: "User-Agent set in the downloader config file",
        tags: &["core", "http", "config"],
        enabled: false,
        reason: Some("user_agent field of the downloader config file not implemented yet"),
        factory: |config| {
            let (ctx, data) = prepare(
                "custom_user_agent_config",
                config,
                "core.http_client.custom_user_agent",
                Some(600),
            )?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")
                .without_base_command()
                .config_file(config.resolve_path(DEFAULT_DOWNLOADER_CONFIG))
                .leading_arg("--verbose");
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "temp_files_cleanup",
        category: "core",
        description: "Temporary files removed after a download",
        tags: &["core", "temp", "cleanup"],
        enabled: false,
        reason: Some("temporary file management not finished"),
        factory: |config| {
            let (ctx, data) = prepare("temp_files_cleanup", config, "core.temp_files.normal_cleanup", Some(600))?;
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL").forbid_leftovers(TEMP_PATTERNS);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "default_output_path",
        category: "core",
        description: "Default output template",
        tags: &["core", "output", "template"],
        enabled: false,
        reason: Some("output templates not implemented yet"),
        factory: |config| {
            let (ctx, data) = prepare("default_output_path", config, "core.output_template.default", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "disk_space_error",
        category: "core",
        description: "Unwritable output is reported as an error",
        tags: &["core", "error", "disk"],
        enabled: false,
        reason: Some("disk space detection not implemented yet"),
        factory: |config| {
            let (ctx, data) = prepare("disk_space_error", config, "core.error_handling.disk_space", Some(60))?;
            let scenario = ErrorHandling::with_url(ErrorKind::DiskSpace, data.url_or("PLACEHOLDER_VIDEO_URL"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "ffmpeg_not_available",
        category: "core",
        description: "Missing FFmpeg is handled without a crash",
        tags: &["core", "error", "ffmpeg"],
        enabled: false,
        reason: Some("FFmpeg detection not finished"),
        factory: |config| {
            let (ctx, data) = prepare("ffmpeg_not_available", config, "core.muxer.basic", Some(600))?;
            let scenario = ErrorHandling::with_url(ErrorKind::MissingFfmpeg, data.url_or("PLACEHOLDER_VIDEO_URL"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "auth_required",
        category: "core",
        description: "Content that requires a login",
        tags: &["core", "error", "auth"],
        enabled: false,
        reason: Some("needs a URL that requires authentication in the URLs file"),
        factory: |config| {
            let (mut ctx, data) = prepare("auth_required", config, "auth_required", Some(600))?;
            // Credentials are used only when the data opts in.
            ctx.requires_auth = data.get_bool("use_auth").unwrap_or(false);
            if !ctx.requires_auth {
                ctx.auth_file = None;
            }
            let url = data.url_or("PLACEHOLDER_AUTH_REQUIRED_URL");
            Ok(TestCase::new(ctx, ErrorHandling::with_url(ErrorKind::AuthRequired, url)))
        },
    },
    // bilibili: basic downloads
    CaseEntry {
        id: "bv_video_download",
        category: "bilibili",
        description: "BV id video download",
        tags: &["bilibili", "download", "basic", "bv"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("bv_video_download", config, "bilibili.basic_download.bv_video", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "av_video_download",
        category: "bilibili",
        description: "AV id video download",
        tags: &["bilibili", "download", "av"],
        enabled: false,
        reason: Some("needs an AV id URL in the URLs file"),
        factory: |config| {
            let (ctx, data) = prepare("av_video_download", config, "bilibili.basic_download.av_video", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_AV_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "multi_page_video_download",
        category: "bilibili",
        description: "Multi-part video download",
        tags: &["bilibili", "download", "basic", "multi-page"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare(
                "multi_page_video_download",
                config,
                "bilibili.basic_download.multi_page",
                Some(900),
            )?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_MULTI_PAGE_URL")))
        },
    },
    CaseEntry {
        id: "bangumi_ep_download",
        category: "bilibili",
        description: "Bangumi episode (ep id) download",
        tags: &["bilibili", "download", "bangumi", "ep"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("bangumi_ep_download", config, "bilibili.basic_download.bangumi_ep", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_BANGUMI_EP_URL")))
        },
    },
    CaseEntry {
        id: "bangumi_ss_download",
        category: "bilibili",
        description: "Bangumi season (ss id) download",
        tags: &["bilibili", "download", "bangumi", "ss"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("bangumi_ss_download", config, "bilibili.basic_download.bangumi_ss", Some(900))?;
            let limit = data.get_u64("batch_limit").unwrap_or(3);
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_BANGUMI_SS_URL").batch_limit(limit);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // bilibili: batch downloads
    CaseEntry {
        id: "favorites_batch_download",
        category: "bilibili",
        description: "Favorites folder batch download",
        tags: &["bilibili", "batch", "favorites"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare(
                "favorites_batch_download",
                config,
                "bilibili.batch_download.favorites",
                Some(1200),
            )?;
            let limit = data.get_u64("batch_limit").unwrap_or(5);
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_FAVORITES_URL").batch_limit(limit);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "user_space_batch_download",
        category: "bilibili",
        description: "Uploader space batch download",
        tags: &["bilibili", "batch", "wbi"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare(
                "user_space_batch_download",
                config,
                "bilibili.batch_download.user_space",
                Some(1200),
            )?;
            let limit = data.get_u64("batch_limit").unwrap_or(5);
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_USER_SPACE_URL").batch_limit(limit);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // bilibili: quality
    CaseEntry {
        id: "quality_selection",
        category: "bilibili",
        description: "Quality selection",
        tags: &["bilibili", "quality", "basic"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("quality_selection", config, "quality_selection", Some(600))?;
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "quality_priority",
        category: "bilibili",
        description: "Quality priority list",
        tags: &["bilibili", "quality", "priority"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (mut ctx, data) = prepare(
                "quality_priority",
                config,
                "bilibili.quality_selection.quality_priority",
                Some(600),
            )?;
            ctx.quality.get_or_insert_with(|| "1080P,720P,480P".to_string());
            Ok(TestCase::new(ctx, VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "codec_priority",
        category: "bilibili",
        description: "Codec priority list",
        tags: &["bilibili", "quality", "codec"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare(
                "codec_priority",
                config,
                "bilibili.quality_selection.codec_priority",
                Some(600),
            )?;
            let codec = data.get_str("codec").unwrap_or_else(|| "hevc,avc,av1".to_string());
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL").codec(codec);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "dolby_vision",
        category: "bilibili",
        description: "Dolby Vision download",
        tags: &["bilibili", "quality", "dolby", "vip"],
        enabled: true,
        reason: None,
        factory: |config| {
            let key = "bilibili.quality_selection.dolby_vision";
            let (mut ctx, data) = prepare("dolby_vision", config, key, Some(900))?;
            ctx.quality.get_or_insert_with(|| "杜比视界".to_string());
            Ok(TestCase::new(ctx, DolbyVision::from_data(&data, "PLACEHOLDER_DOLBY_VISION_URL")))
        },
    },
    // bilibili: danmaku
    CaseEntry {
        id: "xml_danmaku",
        category: "bilibili",
        description: "XML danmaku download",
        tags: &["bilibili", "danmaku", "xml"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("xml_danmaku", config, "bilibili.danmaku.xml_format", Some(600))?;
            Ok(TestCase::new(ctx, DanmakuDownload::from_data(&data, DanmakuFormat::Xml)))
        },
    },
    CaseEntry {
        id: "ass_danmaku",
        category: "bilibili",
        description: "ASS danmaku conversion",
        tags: &["bilibili", "danmaku", "ass"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("ass_danmaku", config, "bilibili.danmaku.ass_format", Some(600))?;
            Ok(TestCase::new(ctx, DanmakuDownload::from_data(&data, DanmakuFormat::Ass)))
        },
    },
    CaseEntry {
        id: "danmaku_decompression",
        category: "bilibili",
        description: "Compressed danmaku stream is inflated",
        tags: &["bilibili", "danmaku", "decompression"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("danmaku_decompression", config, "bilibili.danmaku.xml_format", Some(600))?;
            let scenario = DanmakuDownload::decompression(data.url_or("PLACEHOLDER_VIDEO_URL"));
            Ok(TestCase::new(ctx, scenario))
        },
    },
    // bilibili: subtitles and chapters
    CaseEntry {
        id: "single_subtitle",
        category: "bilibili",
        description: "Single subtitle download",
        tags: &["bilibili", "subtitle", "basic"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("single_subtitle", config, "bilibili.subtitle.single_subtitle", Some(600))?;
            Ok(TestCase::new(ctx, SubtitleDownload::from_data(&data, "PLACEHOLDER_VIDEO_URL")))
        },
    },
    CaseEntry {
        id: "multi_language_subtitle",
        category: "bilibili",
        description: "Multi-language subtitles",
        tags: &["bilibili", "subtitle", "multilang"],
        enabled: false,
        reason: Some("needs a multi-language subtitle URL in the URLs file"),
        factory: |config| {
            let key = "bilibili.subtitle.multi_subtitle";
            let (ctx, data) = prepare("multi_language_subtitle", config, key, Some(600))?;
            Ok(TestCase::new(ctx, SubtitleDownload::from_data(&data, "PLACEHOLDER_MULTI_SUBTITLE_URL")))
        },
    },
    CaseEntry {
        id: "normal_video_chapters",
        category: "bilibili",
        description: "Chapter information of a normal video",
        tags: &["bilibili", "chapters", "normal"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("normal_video_chapters", config, "bilibili.chapters.with_chapters", Some(600))?;
            Ok(TestCase::new(ctx, ChapterInfo::from_data(&data, "PLACEHOLDER_CHAPTERS_URL")))
        },
    },
    CaseEntry {
        id: "chapter_embedding",
        category: "bilibili",
        description: "Chapters embedded into the downloaded video",
        tags: &["bilibili", "chapters", "embed"],
        enabled: true,
        reason: None,
        factory: |config| {
            let (ctx, data) = prepare("chapter_embedding", config, "bilibili.chapters.with_chapters", Some(600))?;
            let found = "Chapter information mentioned in output";
            let mention = Hint::output("chapter_mention", CHAPTER_KEYWORDS.iter().copied(), found)
                .or_note("No chapter mention (video may not have chapters)");
            let scenario = VideoDownload::from_data(&data, "PLACEHOLDER_CHAPTERS_URL")
                .containers(MUXED_PATTERNS)
                .hint(mention);
            Ok(TestCase::new(ctx, scenario))
        },
    },
    CaseEntry {
        id: "bangumi_chapters",
        category: "bilibili",
        description: "Chapter information of a bangumi episode",
        tags: &["bilibili", "chapters", "bangumi"],
        enabled: false,
        reason: Some("needs a bangumi chapters URL in the URLs file"),
        factory: |config| {
            let (ctx, data) = prepare("bangumi_chapters", config, "bilibili.chapters.bangumi_chapters", Some(600))?;
            Ok(TestCase::new(ctx, ChapterInfo::from_data(&data, "PLACEHOLDER_BANGUMI_CHAPTERS_URL")))
        },
    },
];

pub static SUITES: &[Suite] = &[
    Suite {
        name: "smoke",
        description: "Quick check of the core download path",
        cases: SuiteCases::Listed(&[
            "default_config",
            "builtin_downloader",
            "basic_mux",
            "bv_video_download",
            "quality_selection",
        ]),
    },
    Suite {
        name: "core",
        description: "Platform-independent downloader behaviour",
        cases: SuiteCases::Listed(&[
            "default_config",
            "custom_config",
            "cli_priority",
            "builtin_downloader",
            "download_progress",
            "basic_mux",
            "subtitle_embed",
            "chapter_embed",
            "skip_mux",
            "default_user_agent",
            "custom_user_agent_cli",
            "invalid_url",
            "network_error",
        ]),
    },
    Suite {
        name: "bilibili",
        description: "All Bilibili features",
        cases: SuiteCases::Listed(&[
            "bv_video_download",
            "multi_page_video_download",
            "bangumi_ep_download",
            "bangumi_ss_download",
            "favorites_batch_download",
            "user_space_batch_download",
            "quality_selection",
            "quality_priority",
            "codec_priority",
            "dolby_vision",
            "xml_danmaku",
            "ass_danmaku",
            "danmaku_decompression",
            "single_subtitle",
            "normal_video_chapters",
            "chapter_embedding",
        ]),
    },
    Suite {
        name: "full",
        description: "Every enabled test",
        cases: SuiteCases::AllEnabled,
    },
];

/// The downloader config file a case passes: its own `config_file`, else
/// `platform.config_file`, else [`DEFAULT_DOWNLOADER_CONFIG`].
fn downloader_config(data: &TestData, config: &Config) -> PathBuf {
    data.get_str("config_file")
        .filter(|p| !p.is_empty())
        .map(|p| config.resolve_path(p))
        .or_else(|| config.config_file_path())
        .unwrap_or_else(|| config.resolve_path(DEFAULT_DOWNLOADER_CONFIG))
}

/// Shared factory prelude: create the context, load the case's test data and
/// apply it. An empty `data_key` means the case needs no test data.
fn prepare(
    id: &str,
    config: &Config,
    data_key: &str,
    timeout_secs: Option<u64>,
) -> Result<(CaseContext, TestData), RegistryError> {
    let tags = find(id).map(|e| e.tags).unwrap_or_default();
    let mut ctx = CaseContext::new(id, config)
        .map_err(|source| RegistryError::Build {
            id: id.to_string(),
            source,
        })?
        .with_tags(tags.iter().copied());
    if let Some(secs) = timeout_secs {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    let data = if data_key.is_empty() {
        TestData::default()
    } else {
        TestData::load(config, data_key)
    };
    ctx.apply_test_data(&data, config);
    Ok((ctx, data))
}

// ============================================================================
// Lookup
// ============================================================================

pub fn entries() -> &'static [CaseEntry] {
    ENTRIES
}

pub fn enabled() -> impl Iterator<Item = &'static CaseEntry> {
    ENTRIES.iter().filter(|e| e.enabled)
}

pub fn find(id: &str) -> Option<&'static CaseEntry> {
    ENTRIES.iter().find(|e| e.id == id)
}

/// Build an enabled case by id.
pub fn build(id: &str, config: &Config) -> Result<TestCase, RegistryError> {
    let entry = find(id).ok_or_else(|| RegistryError::UnknownCase(id.to_string()))?;
    if !entry.enabled {
        return Err(RegistryError::Disabled {
            id: id.to_string(),
            reason: entry.reason.unwrap_or("not specified").to_string(),
        });
    }
    debug!(case = id, "loading test");
    (entry.factory)(config)
}

/// Build every id in order, skipping (and logging) the ones that fail.
pub fn build_all<'a>(ids: impl IntoIterator<Item = &'a str>, config: &Config) -> Vec<TestCase> {
    ids.into_iter()
        .filter_map(|id| match build(id, config) {
            Ok(case) => Some(case),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

/// Enabled entry ids whose id contains `pattern` (when given) and that carry at
/// least one of `tags` (when non-empty).
pub fn filter(pattern: Option<&str>, tags: &[String]) -> Vec<&'static str> {
    enabled()
        .filter(|e| pattern.is_none_or(|p| e.id.contains(p)))
        .filter(|e| tags.is_empty() || e.has_any_tag(tags))
        .map(|e| e.id)
        .collect()
}

pub fn suite(name: &str) -> Option<Vec<&'static str>> {
    let suite = SUITES.iter().find(|s| s.name == name)?;
    Some(match suite.cases {
        SuiteCases::Listed(ids) => ids.to_vec(),
        SuiteCases::AllEnabled => enabled().map(|e| e.id).collect(),
    })
}

pub fn suite_names() -> Vec<&'static str> {
    SUITES.iter().map(|s| s.name).collect()
}
