//! CLI module for the rvd end-to-end harness
//!
//! ## Commands
//!
//! - `run [TESTS]...` - Run selected tests and write reports
//! - `list` - Show registered tests and suites
//! - `clean` - Remove the base working directory
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::version::RVD_E2E_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// End-to-end test harness for the rvd video downloader
#[derive(Parser, Debug)]
#[command(name = "rvd-e2e")]
#[command(version = RVD_E2E_VERSION)]
#[command(about = "End-to-end test harness for the rvd video downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tests (default: the smoke suite)
    Run(RunArgs),

    /// List registered tests and suites
    List {
        /// Also show disabled tests and why
        #[arg(long)]
        show_disabled: bool,
    },

    /// Remove the base working directory
    Clean {
        /// Configuration file
        #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Test ids to run
    #[arg(value_name = "TESTS")]
    pub tests: Vec<String>,

    /// Run a named suite
    #[arg(long, value_parser = ["smoke", "core", "bilibili", "full"])]
    pub suite: Option<String>,

    /// Run tests carrying any of these tags
    #[arg(long, num_args = 1.., value_name = "TAG")]
    pub tags: Vec<String>,

    /// Run tests whose id contains PATTERN
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Run tests concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Worker count for --parallel (default: execution.max_workers)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Stop on first failure (sequential runs only)
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Debug logging and artifact listing
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run(args) => commands::run_tests(&args),
        Command::List { show_disabled } => {
            print!("{}", commands::render_list(show_disabled));
            Ok(ExitCode::SUCCESS)
        }
        Command::Clean { config } => commands::clean(&config),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["rvd-e2e", "run"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert!(args.tests.is_empty());
        assert_eq!(args.config, PathBuf::from("config.yaml"));
        assert_eq!(args.workers, None);
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "rvd-e2e", "run", "--tags", "danmaku", "subtitle", "--parallel", "--workers", "2", "-x", "-v", "-p", "bv",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.tags, vec!["danmaku", "subtitle"]);
        assert!(args.parallel && args.stop_on_fail && args.verbose);
        assert_eq!(args.workers, Some(2));
        assert_eq!(args.pattern.as_deref(), Some("bv"));
    }

    #[test]
    fn test_cli_parse_explicit_tests() {
        let cli = Cli::try_parse_from(["rvd-e2e", "run", "invalid_url", "network_error"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.tests, vec!["invalid_url", "network_error"]);
    }

    #[test]
    fn test_cli_rejects_unknown_suite() {
        assert!(Cli::try_parse_from(["rvd-e2e", "run", "--suite", "nightly"]).is_err());
        assert!(Cli::try_parse_from(["rvd-e2e", "run", "--suite", "full"]).is_ok());
    }

    #[test]
    fn test_cli_parse_list_and_clean() {
        let cli = Cli::try_parse_from(["rvd-e2e", "list", "--show-disabled"]).unwrap();
        assert!(matches!(cli.command, Command::List { show_disabled: true }));

        let cli = Cli::try_parse_from(["rvd-e2e", "clean", "--config", "e2e/config.yaml"]).unwrap();
        assert!(matches!(cli.command, Command::Clean { .. }));
    }
}
