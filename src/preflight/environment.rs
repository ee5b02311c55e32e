//! Invoking-environment checks (privileges, scratch space).

use std::path::Path;

use crate::process::Cmd;

use super::types::CheckResult;

/// Staging keeps two copies of the ISO contents plus the extracted
/// squashfs tree; warn below this much free space.
const MIN_FREE_GB: u64 = 20;

/// Check privileges and the invoking directory.
pub fn check_environment(parent_dir: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    // Loopback mounts and ownership-preserving copies need euid 0.
    if is_root() {
        results.push(CheckResult::pass("superuser"));
    } else {
        results.push(CheckResult::fail(
            "superuser",
            "This program requires superuser privileges, please run it as root.",
        ));
    }

    // The work directory and the output ISO both land here.
    let probe = parent_dir.join(".autoiso-preflight");
    match std::fs::write(&probe, "probe") {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            results.push(CheckResult::pass("working directory writable"));
        }
        Err(e) => {
            results.push(CheckResult::fail(
                "working directory writable",
                &format!("Cannot write to {}: {}", parent_dir.display(), e),
            ));
        }
    }

    if let Some(free_gb) = free_space_gb(parent_dir) {
        if free_gb < MIN_FREE_GB {
            results.push(CheckResult::warn(
                "disk space",
                &format!(
                    "{}GB free - staging a desktop image needs roughly twice its size",
                    free_gb
                ),
            ));
        } else {
            results.push(CheckResult::pass_with(
                "disk space",
                &format!("{}GB free", free_gb),
            ));
        }
    }

    results
}

/// True when the effective uid is root.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Free space under `dir` in whole gigabytes, via `df`.
fn free_space_gb(dir: &Path) -> Option<u64> {
    let result = Cmd::new("df")
        .args(["--output=avail", "-B1"])
        .arg_path(dir)
        .allow_fail()
        .run()
        .ok()?;

    if !result.success() {
        return None;
    }
    parse_df_avail(&result.stdout)
}

/// Parse `df --output=avail -B1` output: header line, then bytes.
fn parse_df_avail(stdout: &str) -> Option<u64> {
    let avail_bytes: u64 = stdout.lines().nth(1)?.trim().parse().ok()?;
    Some(avail_bytes / (1024 * 1024 * 1024))
}
