//! The per-case state machine.
//!
//! ```text
//! Created -> SettingUp -> Executing -> CollectingArtifacts -> Validating -> TearingDown -> Completed
//! ```
//!
//! Any failure before `Validating` skips straight to artifact collection (if it has
//! not happened yet) and teardown. Teardown and the final duration always happen.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};
use walkdir::WalkDir;

use super::case::{CaseError, TestCase};
use super::process::{CommandExecutor, CommandSpec, ProcessError};
use super::result::TestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    SettingUp,
    Executing,
    CollectingArtifacts,
    Validating,
    TearingDown,
    Completed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::SettingUp => "setting_up",
            Phase::Executing => "executing",
            Phase::CollectingArtifacts => "collecting_artifacts",
            Phase::Validating => "validating",
            Phase::TearingDown => "tearing_down",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Tracker<'a> {
    observer: &'a mut dyn FnMut(Phase),
    collected: bool,
}

impl Tracker<'_> {
    fn enter(&mut self, phase: Phase) {
        debug!(phase = %phase, "phase");
        (self.observer)(phase);
    }

    fn collect(&mut self, workdir: &Path, result: &mut TestResult) {
        if self.collected {
            return;
        }
        self.enter(Phase::CollectingArtifacts);
        result.artifacts = collect_artifacts(workdir);
        self.collected = true;
    }
}

pub(crate) fn run(case: &TestCase, executor: &dyn CommandExecutor, observer: &mut dyn FnMut(Phase)) -> TestResult {
    let ctx = case.context();
    let span = info_span!("case", name = %ctx.name);
    let _guard = span.enter();

    let start = Instant::now();
    let mut result = TestResult::new(&ctx.name);
    let mut tracker = Tracker {
        observer,
        collected: false,
    };
    tracker.enter(Phase::Created);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(case, executor, &mut result, &mut tracker)));

    match outcome {
        Ok(Ok(passed)) => result.passed = passed,
        Ok(Err(CaseError::Process(e @ ProcessError::Timeout(_)))) => {
            warn!(timeout_secs = ctx.timeout.as_secs(), "timed out");
            result.passed = false;
            result.error = e.to_string();
        }
        Ok(Err(e)) => {
            error!(error = %e, "execution failed");
            result.passed = false;
            result.error = format!("Test execution failed: {}", e);
        }
        Err(payload) => {
            error!("scenario panicked");
            result.passed = false;
            result.error = format!("Test execution panicked: {}", panic_message(payload.as_ref()));
        }
    }

    tracker.collect(&ctx.workdir, &mut result);

    tracker.enter(Phase::TearingDown);
    let scenario = case.scenario();
    match panic::catch_unwind(AssertUnwindSafe(|| scenario.teardown(ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(error = %e, "teardown failed");
            result.append_error(&format!("Teardown failed: {}", e));
        }
        Err(payload) => {
            warn!("teardown panicked");
            result.append_error(&format!("Teardown failed: panicked: {}", panic_message(payload.as_ref())));
        }
    }

    result.duration = start.elapsed();
    tracker.enter(Phase::Completed);
    info!(
        passed = result.passed,
        duration_secs = result.duration.as_secs_f64(),
        artifacts = result.artifacts.len(),
        "finished"
    );
    result
}

fn execute(
    case: &TestCase,
    executor: &dyn CommandExecutor,
    result: &mut TestResult,
    tracker: &mut Tracker<'_>,
) -> Result<bool, CaseError> {
    let ctx = case.context();
    let scenario = case.scenario();

    tracker.enter(Phase::SettingUp);
    scenario.setup(ctx)?;

    tracker.enter(Phase::Executing);
    let argv = scenario.command(ctx)?;
    if argv.is_empty() {
        return Err(CaseError::Command("scenario produced an empty command".to_string()));
    }
    info!(command = %argv.join(" "), "executing");
    let spec = CommandSpec::new(argv, &ctx.workdir).with_env(ctx.env.iter().cloned());
    let outcome = executor.execute(&spec, ctx.timeout);

    // Partial artifacts are diagnostic, so collect them even when the process failed.
    tracker.collect(&ctx.workdir, result);

    let output = outcome?;
    debug!(exit_code = ?output.exit_code, "process exited");
    result.output = output.stdout;
    result.error = output.stderr;
    result.exit_code = output.exit_code;

    tracker.enter(Phase::Validating);
    Ok(scenario.validate(ctx, result))
}

/// Regular files under `workdir`, absolute and sorted. Unreadable entries are skipped.
pub fn collect_artifacts(workdir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(workdir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;

    use rvd_e2e_validators::{CapturedOutput, OutputValidator};

    use super::*;
    use crate::config::Config;
    use crate::harness::case::{CaseContext, Scenario};
    use crate::harness::process::ProcessOutput;

    // ========================================
    // Fixtures
    // ========================================

    enum Behaviour {
        Succeed(&'static str),
        Timeout,
        SpawnFails,
    }

    struct FakeExecutor {
        behaviour: Behaviour,
        writes: Vec<(&'static str, usize)>,
        seen: Mutex<Vec<CommandSpec>>,
    }

    impl FakeExecutor {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                writes: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, spec: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
            self.seen.lock().unwrap().push(spec.clone());
            for (name, len) in &self.writes {
                fs::write(spec.cwd.join(name), vec![0u8; *len]).unwrap();
            }
            match self.behaviour {
                Behaviour::Succeed(stdout) => Ok(ProcessOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                }),
                Behaviour::Timeout => Err(ProcessError::Timeout(timeout)),
                Behaviour::SpawnFails => Err(ProcessError::Spawn {
                    program: spec.argv[0].clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Scripted {
        fail_setup: bool,
        fail_teardown: bool,
        panic_in_validate: bool,
    }

    impl Scenario for Scripted {
        fn command(&self, ctx: &CaseContext) -> Result<Vec<String>, CaseError> {
            let mut cmd = ctx.base_command();
            cmd.push("https://example.test/video".to_string());
            cmd.extend(ctx.output_args());
            Ok(cmd)
        }

        fn validate(&self, _ctx: &CaseContext, result: &mut TestResult) -> bool {
            if self.panic_in_validate {
                panic!("validator exploded");
            }
            let v = OutputValidator::new().contains("completed");
            let verdict = v.validate(&CapturedOutput::new(&result.output, &result.error, result.exit_code));
            result.record("output", verdict)
        }

        fn setup(&self, _ctx: &CaseContext) -> Result<(), CaseError> {
            if self.fail_setup {
                return Err(CaseError::Hook("cookie jar missing".to_string()));
            }
            Ok(())
        }

        fn teardown(&self, _ctx: &CaseContext) -> Result<(), CaseError> {
            if self.fail_teardown {
                return Err(CaseError::Hook("could not unmount".to_string()));
            }
            Ok(())
        }
    }

    fn case(dir: &Path, scripted: Scripted) -> TestCase {
        let config = Config::from_value(dir, serde_yaml::from_str("platform:\n  executable: /bin/rvd\n").unwrap());
        let ctx = CaseContext::new("scripted", &config).unwrap().with_timeout(Duration::from_secs(7));
        TestCase::new(ctx, scripted)
    }

    fn phases(case: &TestCase, exec: &FakeExecutor) -> (TestResult, Vec<Phase>) {
        let mut seen = Vec::new();
        let result = case.run_observed(exec, &mut |p| seen.push(p));
        (result, seen)
    }

    // ========================================
    // Happy path
    // ========================================

    #[test]
    fn test_full_phase_order() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(dir.path(), Scripted::default());
        let exec = FakeExecutor::new(Behaviour::Succeed("Download completed"));

        let (result, seen) = phases(&case, &exec);
        assert!(result.passed);
        assert_eq!(
            seen,
            vec![
                Phase::Created,
                Phase::SettingUp,
                Phase::Executing,
                Phase::CollectingArtifacts,
                Phase::Validating,
                Phase::TearingDown,
                Phase::Completed
            ]
        );
    }

    #[test]
    fn test_command_runs_in_workdir_with_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(dir.path(), Scripted::default());
        let exec = FakeExecutor::new(Behaviour::Succeed("completed"));
        case.run(&exec);

        let seen = exec.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].cwd, case.context().workdir);
        assert_eq!(seen[0].argv[0], "/bin/rvd");
        assert_eq!(seen[0].argv.last().unwrap().as_str(), case.context().workdir.to_str().unwrap());
    }

    #[test]
    fn test_artifacts_are_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(dir.path(), Scripted::default());
        fs::create_dir_all(case.context().workdir.join("nested")).unwrap();
        fs::write(case.context().workdir.join("nested/b.xml"), "x").unwrap();
        let mut exec = FakeExecutor::new(Behaviour::Succeed("completed"));
        exec.writes = vec![("a.mp4", 10)];

        let result = case.run(&exec);
        let names: Vec<_> = result
            .artifacts
            .iter()
            .map(|p| p.strip_prefix(&case.context().workdir).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("a.mp4"), PathBuf::from("nested/b.xml")]);
        assert!(result.artifacts.iter().all(|p| p.is_absolute()));
    }

    // ========================================
    // Failure paths
    // ========================================

    #[test]
    fn test_timeout_skips_validation_but_collects_and_tears_down() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(dir.path(), Scripted::default());
        let mut exec = FakeExecutor::new(Behaviour::Timeout);
        exec.writes = vec![("video.mp4.part", 5)];

        let (result, seen) = phases(&case, &exec);
        assert!(!result.passed);
        assert_eq!(result.error, "Test timed out after 7 seconds");
        assert_eq!(result.output, "");
        assert_eq!(result.artifacts.len(), 1);
        assert!(!seen.contains(&Phase::Validating));
        assert!(seen.contains(&Phase::TearingDown));
        assert_eq!(seen.last(), Some(&Phase::Completed));
    }

    #[test]
    fn test_spawn_failure_is_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(dir.path(), Scripted::default());
        let result = case.run(&FakeExecutor::new(Behaviour::SpawnFails));
        assert!(!result.passed);
        assert!(result.error.starts_with("Test execution failed: failed to launch /bin/rvd"));
    }

    #[test]
    fn test_setup_failure_never_executes() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(
            dir.path(),
            Scripted {
                fail_setup: true,
                ..Scripted::default()
            },
        );
        let exec = FakeExecutor::new(Behaviour::Succeed("completed"));

        let (result, seen) = phases(&case, &exec);
        assert!(!result.passed);
        assert_eq!(result.error, "Test execution failed: cookie jar missing");
        assert!(exec.seen.lock().unwrap().is_empty());
        assert!(!seen.contains(&Phase::Executing));
        assert!(seen.contains(&Phase::CollectingArtifacts));
    }

    #[test]
    fn test_panic_in_validate_becomes_failure() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(
            dir.path(),
            Scripted {
                panic_in_validate: true,
                ..Scripted::default()
            },
        );
        let (result, seen) = phases(&case, &FakeExecutor::new(Behaviour::Succeed("completed")));
        assert!(!result.passed);
        assert_eq!(result.error, "Test execution panicked: validator exploded");
        assert_eq!(seen.last(), Some(&Phase::Completed));
    }

    #[test]
    fn test_teardown_error_appends_without_changing_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let case = case(
            dir.path(),
            Scripted {
                fail_teardown: true,
                ..Scripted::default()
            },
        );
        let result = case.run(&FakeExecutor::new(Behaviour::Succeed("Download completed")));
        assert!(result.passed);
        assert_eq!(result.error, "Teardown failed: could not unmount");
    }

    #[test]
    fn test_collect_artifacts_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_artifacts(&dir.path().join("gone")).is_empty());
    }
}
