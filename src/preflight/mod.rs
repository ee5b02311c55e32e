//! Preflight checks for the image build.
//!
//! Validates the host environment before any mount or copy happens.
//! A failed report aborts the run with exit status -1 (the historical
//! contract for missing dependencies or non-root invocation).

mod environment;
mod host_tools;
mod types;

use std::path::Path;

pub use environment::is_root;
pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks against the invoking directory.
pub fn run_preflight(parent_dir: &Path) -> PreflightReport {
    let mut checks = Vec::new();
    checks.extend(host_tools::check_host_tools());
    checks.extend(environment::check_environment(parent_dir));
    PreflightReport { checks }
}
