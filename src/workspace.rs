//! Temporary build workspace: mount points and writable staging copies.
//!
//! Layout inside the invoking directory:
//!
//! ```text
//! autoiso-<random>/
//!   iso/       read-only loopback mount of the source image
//!   squash/    read-only loopback mount of iso/casper/filesystem.squashfs
//!   isorw/     writable copy of iso/
//!   squashrw/  writable copy of squash/
//! ```
//!
//! Correctness depends on strict sequencing: mount, copy, unmount,
//! then patch only the writable copies.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Path of the compressed filesystem inside the mounted image.
const SQUASHFS_IN_ISO: &str = "casper/filesystem.squashfs";

pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    /// Create a fresh `autoiso-*` working directory under `parent_dir`.
    ///
    /// The random suffix keeps concurrent-ish runs from colliding and
    /// tags the output image name, so reruns never overwrite an
    /// earlier build.
    pub fn create(parent_dir: &Path) -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("autoiso-")
            .tempdir_in(parent_dir)
            .with_context(|| {
                format!(
                    "Failed to create working directory in {}",
                    parent_dir.display()
                )
            })?
            .keep();
        Ok(Self { root })
    }

    /// Directory name; doubles as the uniqueness tag in the output
    /// image name.
    pub fn name(&self) -> &str {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("autoiso")
    }

    pub fn iso_mount(&self) -> PathBuf {
        self.root.join("iso")
    }

    pub fn squash_mount(&self) -> PathBuf {
        self.root.join("squash")
    }

    /// Writable copy of the ISO contents.
    pub fn iso_tree(&self) -> PathBuf {
        self.root.join("isorw")
    }

    /// Writable copy of the extracted squashfs.
    pub fn squash_tree(&self) -> PathBuf {
        self.root.join("squashrw")
    }

    /// Mount the source image and its embedded squashfs, copy both
    /// into writable trees, then unmount the originals.
    pub fn stage(&self, base_iso: &Path) -> Result<()> {
        fs::create_dir(self.iso_mount())?;
        fs::create_dir(self.squash_mount())?;

        Cmd::new("mount")
            .arg_path(base_iso)
            .arg("iso")
            .dir(&self.root)
            .error_msg("Failed to loopback-mount the source image")
            .run()?;

        let squashfs = self.iso_mount().join(SQUASHFS_IN_ISO);
        if !squashfs.exists() {
            // Unmount before bailing so the workdir can be deleted.
            let _ = Cmd::new("umount").arg("iso").dir(&self.root).allow_fail().run();
            bail!(
                "{} not found inside the mounted image - is this an OEM installer ISO?",
                SQUASHFS_IN_ISO
            );
        }

        Cmd::new("mount")
            .arg(format!("iso/{}", SQUASHFS_IN_ISO))
            .arg("squash")
            .dir(&self.root)
            .error_msg("Failed to loopback-mount the embedded squashfs")
            .run()?;

        // cp -a preserves ownership, modes and symlinks; anything less
        // produces a filesystem the installer refuses to boot.
        Cmd::new("cp")
            .args(["-a", "iso", "isorw"])
            .dir(&self.root)
            .error_msg("Failed to copy the ISO contents")
            .run()?;
        Cmd::new("cp")
            .args(["-a", "squash", "squashrw"])
            .dir(&self.root)
            .error_msg("Failed to copy the squashfs contents")
            .run()?;

        Cmd::new("umount")
            .arg("squash")
            .dir(&self.root)
            .error_msg("Failed to unmount the squashfs")
            .run()?;
        Cmd::new("umount")
            .arg("iso")
            .dir(&self.root)
            .error_msg("Failed to unmount the source image")
            .run()?;

        Ok(())
    }

    /// Remove the working directory.
    pub fn cleanup(self) -> Result<()> {
        fs::remove_dir_all(&self.root)
            .with_context(|| format!("Failed to remove {}", self.root.display()))
    }
}
