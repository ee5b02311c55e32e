//! End-to-end build pipeline: stage, patch, repack, cleanup.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::patch;
use crate::repack;
use crate::workspace::Workspace;

/// Flags selected on the command line.
pub struct BuildOptions {
    /// Stage the image and stop.
    pub extract_only: bool,
    /// Keep the working directory after the image is built.
    pub keep_workdir: bool,
    /// Include the first-boot sanity-test payload.
    pub sanity_test: bool,
}

/// Run the whole pipeline. `base_iso` must be an absolute path; the
/// output lands in `parent_dir`.
pub fn run(base_iso: &Path, parent_dir: &Path, opts: &BuildOptions, config: &Config) -> Result<()> {
    println!(
        "autoiso started, the artifacts will be created in {}",
        parent_dir.display()
    );
    println!("This might take several minutes. Please wait...");
    let start = Instant::now();

    let workspace = Workspace::create(parent_dir)?;

    println!("\n=== Staging {} ===", base_iso.display());
    workspace.stage(base_iso)?;

    if opts.extract_only {
        // Extraction is the product; the workdir always stays.
        println!(
            "autoiso extracted only. Contents under {}",
            workspace.root.display()
        );
        return Ok(());
    }

    println!("\n=== Patching installer filesystem ===");
    patch::apply_all(&workspace.squash_tree(), config, opts.sanity_test)?;

    println!("\n=== Repacking ===");
    repack::rebuild_squashfs(&workspace)?;
    repack::patch_preseed(&workspace.iso_tree())?;

    let output = parent_dir.join(repack::output_iso_name(base_iso, workspace.name()));
    repack::master_iso(&workspace, &output)?;

    let digest = repack::write_checksum(&output)
        .with_context(|| format!("Failed to checksum {}", output.display()))?;
    println!("SHA256: {}", digest);

    if opts.keep_workdir {
        println!("Temporary folder {} kept.", workspace.root.display());
    } else {
        workspace.cleanup()?;
    }

    println!(
        "\nautoiso done in {:.0?}: {}",
        start.elapsed(),
        output.display()
    );
    Ok(())
}
