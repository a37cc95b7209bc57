//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fmt::Write as _;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use tracing::{error, info};

use crate::config::{Config, ReportingSettings};
use crate::harness::{Runner, TestResult, workdir};
use crate::logging;
use crate::registry::{self, SUITES};
use crate::reporters::{ConsoleReporter, HtmlReporter, JsonReporter, Reporter, Summary};

use super::{CliError, CliResult, ExitCode, RunArgs};

const DEFAULT_SUITE: &str = "smoke";

// ============================================================================
// run
// ============================================================================

pub fn run_tests(args: &RunArgs) -> CliResult<ExitCode> {
    let config = load_config(&args.config)?;
    logging::init(&config.logging(), args.verbose);
    info!("rvd e2e test suite starting");

    let ids = select_tests(args)?;
    if ids.is_empty() {
        return Err(CliError::failure("No matching tests found"));
    }

    let cases = registry::build_all(ids.iter().map(String::as_str), &config);
    if cases.is_empty() {
        return Err(CliError::failure("No tests could be loaded"));
    }
    info!("loaded {} test(s)", cases.len());

    let execution = config.execution();
    let parallel = args.parallel || execution.parallel;
    let workers = args.workers.unwrap_or(execution.max_workers);
    let results = Runner::system()
        .stop_on_failure(args.stop_on_fail || execution.stop_on_failure)
        .run_tests(&cases, parallel, workers);

    write_reports(&config.reporting(), &results, args.verbose)?;

    let summary = Summary::of(&results);
    if summary.all_passed() {
        info!("all tests passed");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} test(s) failed", summary.failed);
        Ok(ExitCode::FAILURE)
    }
}

/// Explicit ids win, then `--suite`, then `--tags`/`--pattern`, else the smoke suite.
pub fn select_tests(args: &RunArgs) -> CliResult<Vec<String>> {
    if !args.tests.is_empty() {
        info!("running selected tests: {}", args.tests.join(", "));
        return Ok(args.tests.clone());
    }
    if let Some(name) = &args.suite {
        info!("running suite: {}", name);
        return suite_ids(name);
    }
    if !args.tags.is_empty() || args.pattern.is_some() {
        let ids = registry::filter(args.pattern.as_deref(), &args.tags);
        return Ok(ids.into_iter().map(String::from).collect());
    }
    info!("no tests selected, running the {} suite", DEFAULT_SUITE);
    suite_ids(DEFAULT_SUITE)
}

fn suite_ids(name: &str) -> CliResult<Vec<String>> {
    registry::suite(name)
        .map(|ids| ids.into_iter().map(String::from).collect())
        .ok_or_else(|| CliError::failure(format!("Unknown suite: {}", name)))
}

fn write_reports(settings: &ReportingSettings, results: &[TestResult], verbose: bool) -> CliResult<()> {
    if settings.console {
        let color = std::io::stdout().is_terminal();
        println!("{}", ConsoleReporter::new(color, verbose).generate(results));
    }
    if !settings.json && !settings.html {
        return Ok(());
    }

    fs::create_dir_all(&settings.output_dir).map_err(|e| {
        CliError::failure(format!(
            "Error creating report directory {}: {}",
            settings.output_dir.display(),
            e
        ))
    })?;
    if settings.json {
        write_report(&settings.output_dir.join("latest.json"), &JsonReporter.generate(results))?;
    }
    if settings.html {
        write_report(&settings.output_dir.join("latest.html"), &HtmlReporter.generate(results))?;
    }
    Ok(())
}

fn write_report(path: &Path, contents: &str) -> CliResult<()> {
    fs::write(path, contents)
        .map_err(|e| CliError::failure(format!("Error writing report {}: {}", path.display(), e)))?;
    info!("report saved: {}", path.display());
    Ok(())
}

fn load_config(path: &Path) -> CliResult<Config> {
    Config::load(path).map_err(|e| CliError::failure(format!("Error: {}", e)))
}

// ============================================================================
// list
// ============================================================================

pub fn render_list(show_disabled: bool) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}\nEnabled tests\n{rule}");
    render_entries(&mut out, true);

    if show_disabled {
        let _ = writeln!(out, "\n{rule}\nDisabled tests\n{rule}");
        render_entries(&mut out, false);
    }

    let _ = writeln!(out, "\n{rule}\nSuites\n{rule}");
    for suite in SUITES {
        let count = registry::suite(suite.name).map(|ids| ids.len()).unwrap_or(0);
        let _ = writeln!(out, "\n  {}: {}", suite.name, suite.description);
        let _ = writeln!(out, "    {} test(s)", count);
    }
    out.push('\n');
    out
}

fn render_entries(out: &mut String, enabled: bool) {
    let mut category = "";
    for entry in registry::entries().iter().filter(|e| e.enabled == enabled) {
        if entry.category != category {
            category = entry.category;
            let _ = writeln!(out, "\n[{}]", category.to_uppercase());
        }
        let mark = if enabled { '✓' } else { '✗' };
        let _ = writeln!(out, "  {} {}", mark, entry.id);
        let _ = writeln!(out, "    Description: {}", entry.description);
        let _ = writeln!(out, "    Tags: {}", entry.tags.join(", "));
        if !enabled {
            let _ = writeln!(out, "    Reason: {}", entry.reason.unwrap_or("not specified"));
        }
    }
}

// ============================================================================
// clean
// ============================================================================

pub fn clean(config_path: &Path) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    logging::init(&config.logging(), false);
    let dir = config.default_workdir();
    workdir::cleanup(&dir, false)
        .map_err(|e| CliError::failure(format!("Error removing {}: {}", dir.display(), e)))?;
    info!("removed {}", dir.display());
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================
