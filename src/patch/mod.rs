//! Patches applied to the writable squashfs copy.
//!
//! Two kinds of edit: whole-file payloads dropped into the tree
//! (`oem_config`, `sanity`) and literal byte substitutions to
//! installer files (`installer`, via `substitute`). Everything here
//! operates on the extracted copy; the preseed on the ISO side is
//! handled during repack.

pub mod installer;
pub mod oem_config;
pub mod sanity;
pub mod substitute;

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Apply every squashfs-side patch.
pub fn apply_all(squash_tree: &Path, config: &Config, sanity_test: bool) -> Result<()> {
    oem_config::install(squash_tree, config)?;
    if sanity_test {
        sanity::install(squash_tree, config)?;
    }
    installer::patch_ubiquity(squash_tree)?;
    installer::patch_recovery(squash_tree)?;
    installer::patch_bootstrap(squash_tree)?;
    Ok(())
}
