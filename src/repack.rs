//! Repack the patched trees into a new disc image.
//!
//! Three steps: recompress the patched squashfs over the one in the
//! ISO copy, rewrite the boot preseed, master the image with
//! genisoimage. A `.sha256` sidecar is written next to the output so
//! release artifacts can be verified after transfer.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::process::Cmd;
use crate::workspace::Workspace;
use crate::patch::substitute::{patch_file, Substitution};

/// Boot preseed edits: expose dev recovery, reboot instead of
/// powering off so the sanity run starts unattended.
const PRESEED_SUBS: &[Substitution] = &[
    Substitution::new(
        "# Hide",
        "ubiquity ubuntu-recovery/recovery_type string dev\n\n# Hide",
    ),
    Substitution::new(
        "ubiquity/reboot boolean false",
        "ubiquity/reboot boolean true",
    ),
    Substitution::new(
        "ubiquity/poweroff boolean true",
        "ubiquity/poweroff boolean false",
    ),
];

/// Name of the output image: `<source file name>.<workdir name>.iso`.
pub fn output_iso_name(base_iso: &Path, workdir_name: &str) -> String {
    let base = base_iso
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.iso".to_string());
    format!("{}.{}.iso", base, workdir_name)
}

/// Recompress the patched filesystem over the copy in the ISO tree.
pub fn rebuild_squashfs(workspace: &Workspace) -> Result<()> {
    Cmd::new("mksquashfs")
        .args(["squashrw", "isorw/casper/filesystem.squashfs", "-noappend"])
        .dir(&workspace.root)
        .error_msg("mksquashfs failed")
        .run_interactive()?;
    Ok(())
}

/// Rewrite the boot preseed in the ISO copy.
pub fn patch_preseed(iso_tree: &Path) -> Result<()> {
    patch_file(&iso_tree.join("preseed/project.cfg"), PRESEED_SUBS, 0o755)?;
    Ok(())
}

/// Master the new image from the writable ISO copy.
pub fn master_iso(workspace: &Workspace, output: &Path) -> Result<()> {
    Cmd::new("genisoimage")
        .args([
            "-J",
            "-l",
            "-cache-inodes",
            "-allow-multidot",
            "-r",
            "-input-charset",
            "utf-8",
            "-eltorito-alt-boot",
            "-efi-boot",
            "boot/grub/efi.img",
            "-no-emul-boot",
            "-o",
        ])
        .arg_path(output)
        .arg("isorw")
        .dir(&workspace.root)
        .error_msg("genisoimage failed")
        .run_interactive()?;
    Ok(())
}

/// Write a `<output>.sha256` sidecar in `sha256sum` format and return
/// the digest.
pub fn write_checksum(iso: &Path) -> Result<String> {
    let digest = sha256_file(iso)?;
    let file_name = iso
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| iso.display().to_string());

    let sidecar = PathBuf::from(format!("{}.sha256", iso.display()));
    fs::write(&sidecar, format!("{}  {}\n", digest, file_name))
        .with_context(|| format!("Failed to write {}", sidecar.display()))?;
    Ok(digest)
}

/// SHA-256 of a file, streamed; images run to several gigabytes.
fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
