//! File writing with automatic parent directory creation.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write a file, creating parent directories as needed.
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write a file with specific Unix permissions, creating parent
/// directories as needed. The installer payloads care about their
/// exact modes (hooks must be executable, sudoers must not be).
pub fn write_file_mode<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C, mode: u32) -> Result<()> {
    let path = path.as_ref();
    write_file_with_dirs(path, content)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set mode {:o} on {}", mode, path.display()))?;
    Ok(())
}
