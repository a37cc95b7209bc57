//! Harness version information.
//!
//! Taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time so the CLI
//! and reports agree on the same value.

/// The harness version string (for example, `0.1.0`).
pub const RVD_E2E_VERSION: &str = env!("CARGO_PKG_VERSION");
