//! Subprocess execution behind a trait seam.
//!
//! Cases never spawn processes directly. They hand a [`CommandSpec`] to a
//! [`CommandExecutor`], which lets tests substitute a mock for the downloader and
//! keeps the timeout/kill handling in one place.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Errors raised while launching or waiting for a subprocess.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("failed to start process runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Expected non-completion; kept apart from I/O failures.
    #[error("Test timed out after {} seconds", format_secs(.0))]
    Timeout(Duration),
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout(_))
    }
}

/// A fully-resolved invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Argument vector; the first element is the program.
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    /// Added on top of the inherited parent environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(env);
        self
    }
}

/// Captured output of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Runs a command to completion or until the timeout expires.
///
/// Implementations must kill the child on timeout and report it as
/// [`ProcessError::Timeout`].
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, spec: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, ProcessError>;
}

/// Real subprocess execution through `tokio::process`.
///
/// Each call drives the child on its own current-thread runtime, so the executor
/// can be called from plain worker threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, spec: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
        let (program, args) = spec.argv.split_first().ok_or(ProcessError::EmptyCommand)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProcessError::Runtime)?;

        runtime.block_on(async {
            let mut command = tokio::process::Command::new(program);
            command
                .args(args)
                .current_dir(&spec.cwd)
                .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let child = command.spawn().map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;
            debug!(program = %program, pid = ?child.id(), "spawned");

            // Dropping the pending wait drops the child, which kills it.
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(out)) => Ok(ProcessOutput {
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                    exit_code: out.status.code(),
                }),
                Ok(Err(e)) => Err(ProcessError::Wait(e)),
                Err(_) => Err(ProcessError::Timeout(timeout)),
            }
        })
    }
}

/// Whole seconds when exact, otherwise one decimal.
fn format_secs(d: &Duration) -> String {
    if d.subsec_nanos() == 0 {
        d.as_secs().to_string()
    } else {
        format!("{:.1}", d.as_secs_f64())
    }
}
