//! Test execution engine.
//!
//! ## Modules
//!
//! - `case` - per-case context, the `Scenario` trait, `TestCase`
//! - `lifecycle` - the state machine behind `TestCase::run`
//! - `process` - subprocess execution behind the `CommandExecutor` seam
//! - `result` - `TestResult` and recorded validations
//! - `runner` - sequential / concurrent batch execution
//! - `test_data` - per-case entries from the URLs file
//! - `workdir` - cleanup and size formatting helpers
//!
//! ## Design
//!
//! Nothing above the test-case boundary fails during a run. Timeouts, launch errors,
//! hook errors and scenario panics all become failing [`TestResult`]s, so
//! [`Runner::run_tests`] always returns.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod case;
pub mod lifecycle;
pub mod process;
pub mod result;
pub mod runner;
pub mod test_data;
pub mod workdir;

pub use case::{CaseContext, CaseError, Scenario, TestCase};
pub use lifecycle::{Phase, collect_artifacts};
pub use process::{CommandExecutor, CommandSpec, ProcessError, ProcessOutput, SystemExecutor};
pub use result::{TestResult, ValidationRecord};
pub use runner::Runner;
pub use test_data::TestData;
