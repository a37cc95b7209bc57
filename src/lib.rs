#![forbid(unsafe_code)]
//! End-to-end test harness for the rvd video downloader
//!
//! Each test case launches the real `rvd` executable against a live URL in its own
//! working directory, captures what it printed and what it wrote, and checks both
//! with declarative validators. The crate provides the engine (`harness`), the
//! concrete downloader scenarios, a static registry of cases and suites, reporters,
//! and the `rvd-e2e` CLI.
//!
//! Validators live in the separate `rvd_e2e_validators` crate and know nothing
//! about the engine.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Scenario panics**: A panic inside a scenario is a bug in that scenario. The lifecycle catches it and reports
//!   a failing result whose error says "panicked", so one bad case never takes down a run.

pub mod cli;
pub mod config;
pub mod harness;
pub mod logging;
pub mod registry;
pub mod reporters;
pub mod scenarios;
pub mod version;

pub use config::{Config, ConfigError};
pub use harness::{CaseContext, CaseError, CommandExecutor, Runner, Scenario, TestCase, TestResult};
pub use registry::RegistryError;
pub use reporters::Reporter;
pub use rvd_e2e_validators as validators;
