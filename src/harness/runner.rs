//! Sequential and concurrent execution of test cases.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::{info, info_span, warn};

use super::case::TestCase;
use super::lifecycle::panic_message;
use super::process::{CommandExecutor, SystemExecutor};
use super::result::TestResult;

/// Runs batches of cases against one executor.
#[derive(Clone)]
pub struct Runner {
    executor: Arc<dyn CommandExecutor>,
    stop_on_failure: bool,
}

impl Runner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            stop_on_failure: false,
        }
    }

    /// Runner that launches real subprocesses.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemExecutor))
    }

    /// Halt a sequential run after the first failing result.
    /// Concurrent runs ignore this.
    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run `cases` and return one result per executed case.
    ///
    /// Sequential mode keeps input order and may stop early. Concurrent mode uses
    /// `max_workers` threads (at least one), always runs every case, and returns
    /// results in completion order.
    pub fn run_tests(&self, cases: &[TestCase], parallel: bool, max_workers: usize) -> Vec<TestResult> {
        let mode = if parallel { "concurrent" } else { "sequential" };
        let span = info_span!("runner", mode, cases = cases.len());
        let _guard = span.enter();

        if parallel {
            self.run_concurrent(cases, max_workers)
        } else {
            self.run_sequential(cases)
        }
    }

    fn run_sequential(&self, cases: &[TestCase]) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(cases.len());
        for (i, case) in cases.iter().enumerate() {
            info!("Running test [{}/{}]: {}", i + 1, cases.len(), case.name());
            let result = self.run_guarded(case);
            let failed = !result.passed;
            results.push(result);

            if failed && self.stop_on_failure {
                warn!("Stopping on failure");
                break;
            }
        }
        results
    }

    fn run_concurrent(&self, cases: &[TestCase], max_workers: usize) -> Vec<TestResult> {
        let workers = max_workers.max(1).min(cases.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();
        let mut results = Vec::with_capacity(cases.len());

        thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                s.spawn(move || {
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = cases.get(idx) else { break };
                        if tx.send(self.run_guarded(case)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for result in rx {
                info!(
                    "Completed: {} - {}",
                    result.name,
                    if result.passed { "PASS" } else { "FAIL" }
                );
                results.push(result);
            }
        });

        results
    }

    /// `TestCase::run` already converts failures into results; this catches
    /// anything that escapes it anyway.
    fn run_guarded(&self, case: &TestCase) -> TestResult {
        let executor = self.executor.as_ref();
        guarded(case.name(), || case.run(executor))
    }
}

/// Run `f`, turning a panic into a failed result named `name` with zero duration.
fn guarded(name: &str, f: impl FnOnce() -> TestResult) -> TestResult {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        warn!(case = name, "test escaped its lifecycle");
        TestResult::synthesized_failure(
            name,
            format!("Test execution panicked: {}", panic_message(payload.as_ref())),
        )
    })
}
