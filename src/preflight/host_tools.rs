//! Host tool availability checks.

use super::types::CheckResult;

/// Tools the pipeline shells out to, with package hints.
const REQUIRED_TOOLS: &[(&str, &str, &str)] = &[
    (
        "mksquashfs",
        "squashfs-tools",
        "Required to rebuild casper/filesystem.squashfs",
    ),
    (
        "genisoimage",
        "genisoimage",
        "Required to master the new ISO image",
    ),
    (
        "mount",
        "util-linux",
        "Required to loopback-mount the source image",
    ),
    ("umount", "util-linux", "Required to release loopback mounts"),
    (
        "cp",
        "coreutils",
        "Required to stage writable copies of the mounted trees",
    ),
];

/// Check the external tools are installed.
pub fn check_host_tools() -> Vec<CheckResult> {
    REQUIRED_TOOLS
        .iter()
        .map(|(tool, package, purpose)| match which::which(tool) {
            Ok(path) => CheckResult::pass_with(tool, &path.display().to_string()),
            Err(_) => CheckResult::fail(
                tool,
                &format!("Not found. Install '{}' package. {}", package, purpose),
            ),
        })
        .collect()
}
