//! Test case definition: per-case context plus a scenario.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::lifecycle::{self, Phase};
use super::process::{CommandExecutor, ProcessError};
use super::result::TestResult;
use super::test_data::TestData;
use crate::config::Config;

/// Errors raised inside a case's lifecycle. All of them end up as a failing
/// [`TestResult`]; none escape [`TestCase::run`].
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("failed to create working directory {}: {source}", .path.display())]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid command: {0}")]
    Command(String),

    /// Raised by scenario setup/teardown hooks.
    #[error("{0}")]
    Hook(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Everything a scenario knows about the case it runs in.
#[derive(Debug, Clone)]
pub struct CaseContext {
    pub name: String,
    pub tags: Vec<String>,
    pub timeout: Duration,
    /// Exclusive to this case; also the subprocess working directory.
    pub workdir: PathBuf,
    pub requires_auth: bool,
    /// Case-specific credential file; takes priority over the global default.
    pub auth_file: Option<PathBuf>,
    pub quality: Option<String>,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,
    executable: PathBuf,
    default_auth_file: Option<PathBuf>,
}

impl CaseContext {
    /// Resolve the case's settings from `config` and create its working directory
    /// (`<default_workdir>/<name>`). An existing directory is reused.
    pub fn new(name: impl Into<String>, config: &Config) -> Result<Self, CaseError> {
        let name = name.into();
        let workdir = config.default_workdir().join(&name);
        fs::create_dir_all(&workdir).map_err(|source| CaseError::Workdir {
            path: workdir.clone(),
            source,
        })?;

        Ok(Self {
            name,
            tags: Vec::new(),
            timeout: config.default_timeout(),
            workdir,
            requires_auth: false,
            auth_file: None,
            quality: None,
            env: config.env_overrides(),
            executable: config.executable(),
            default_auth_file: config.auth_file_path(),
        })
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Apply the common keys of a test-data entry: `auth_file`, `quality`, `timeout`.
    pub fn apply_test_data(&mut self, data: &TestData, config: &Config) {
        if let Some(auth) = data.get_str("auth_file").filter(|s| !s.is_empty()) {
            self.requires_auth = true;
            self.auth_file = Some(config.resolve_path(auth));
        }
        if let Some(quality) = data.get_str("quality").filter(|s| !s.is_empty()) {
            self.quality = Some(quality);
        }
        if let Some(secs) = data.get_u64("timeout") {
            self.timeout = Duration::from_secs(secs);
        }
    }

    /// The credential file to pass, if auth is required and one is known.
    pub fn effective_auth_file(&self) -> Option<&Path> {
        if !self.requires_auth {
            return None;
        }
        self.auth_file.as_deref().or(self.default_auth_file.as_deref())
    }

    /// `[executable] [--config-file AUTH] [--quality Q]`.
    ///
    /// Depends only on this context; never reads process state.
    pub fn base_command(&self) -> Vec<String> {
        let mut cmd = vec![self.executable.to_string_lossy().into_owned()];
        if let Some(auth) = self.effective_auth_file() {
            cmd.push("--config-file".to_string());
            cmd.push(auth.to_string_lossy().into_owned());
        }
        if let Some(quality) = &self.quality {
            cmd.push("--quality".to_string());
            cmd.push(quality.clone());
        }
        cmd
    }

    /// `["--output", <workdir>]`, the tail most download scenarios end with.
    pub fn output_args(&self) -> [String; 2] {
        ["--output".to_string(), self.workdir.to_string_lossy().into_owned()]
    }
}

/// The behaviour that distinguishes one test case from another.
///
/// `command` and `validate` are required; `setup` and `teardown` default to no-ops.
/// Implementations hold their own configuration (URL, flags) captured when the
/// case is built and must be shareable across runner workers.
pub trait Scenario: Send + Sync {
    /// Full argument vector; the first element is the executable under test.
    fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError>;

    /// Decide the verdict, recording validator outcomes on `result`.
    fn validate(&self, ctx: &CaseContext, result: &mut TestResult) -> bool;

    fn setup(&self, _ctx: &CaseContext) -> Result<(), CaseError> {
        Ok(())
    }

    fn teardown(&self, _ctx: &CaseContext) -> Result<(), CaseError> {
        Ok(())
    }
}

/// A runnable test case.
pub struct TestCase {
    ctx: CaseContext,
    scenario: Box<dyn Scenario>,
}

impl TestCase {
    pub fn new(ctx: CaseContext, scenario: impl Scenario + 'static) -> Self {
        Self {
            ctx,
            scenario: Box::new(scenario),
        }
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn tags(&self) -> &[String] {
        &self.ctx.tags
    }

    pub fn context(&self) -> &CaseContext {
        &self.ctx
    }

    pub fn scenario(&self) -> &dyn Scenario {
        self.scenario.as_ref()
    }

    /// Run the full lifecycle. Never panics and never fails: every outcome,
    /// including timeouts and scenario bugs, is a [`TestResult`].
    pub fn run(&self, executor: &dyn CommandExecutor) -> TestResult {
        lifecycle::run(self, executor, &mut |_| {})
    }

    /// Like [`run`](Self::run), reporting each phase transition to `observer`.
    pub fn run_observed(&self, executor: &dyn CommandExecutor, observer: &mut dyn FnMut(Phase)) -> TestResult {
        lifecycle::run(self, executor, observer)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.ctx.name)
            .field("tags", &self.ctx.tags)
            .field("timeout", &self.ctx.timeout)
            .finish_non_exhaustive()
    }
}
