//! autoiso - build an unattended OEM auto-install ISO from a base OEM
//! installer image.
//!
//! Mounts the source image, patches its squashfs and preseed so the
//! installation and first boot run without operator input, and masters
//! a new ISO in the current directory. Requires root and the
//! squashfs-tools and genisoimage packages.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use autoiso::build::{self, BuildOptions};
use autoiso::config::Config;
use autoiso::preflight;

#[derive(Parser)]
#[command(name = "autoiso")]
#[command(about = "Build an unattended OEM auto-install ISO from a base OEM image")]
#[command(
    after_help = "EXAMPLE:\n  sudo autoiso -s /srv/images/oem-focal.iso\n\nThe new image lands in the current directory as <image>.<workdir>.iso.\nOverrides (env or .env): AUTOISO_USERNAME, AUTOISO_TIMEZONE,\nAUTOISO_KEYBOARD, AUTOISO_KEYBOARD_LABEL."
)]
struct Cli {
    /// Extract the base ISO image only
    #[arg(short = 'x', long)]
    extract_only: bool,

    /// Keep the temporary folder after the new image is created
    #[arg(short = 'k', long)]
    keep_workdir: bool,

    /// Add the first boot sanity test
    #[arg(short = 's', long)]
    sanity_test: bool,

    /// Path to the base OEM installer image
    image: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    let parent_dir = std::env::current_dir().context("Cannot determine current directory")?;

    let report = preflight::run_preflight(&parent_dir);
    if !report.all_passed() {
        report.print();
        // Missing dependency or non-root invocation: the contract is
        // exit status -1 (observed as 255).
        std::process::exit(-1);
    }

    // The pipeline runs commands from inside the workdir; pin the
    // image to an absolute path first.
    let base_iso = fs::canonicalize(&cli.image)
        .with_context(|| format!("Cannot read source image {}", cli.image.display()))?;

    let opts = BuildOptions {
        extract_only: cli.extract_only,
        keep_workdir: cli.keep_workdir,
        sanity_test: cli.sanity_test,
    };
    build::run(&base_iso, &parent_dir, &opts, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_image() {
        let cli = Cli::try_parse_from(["autoiso", "-x", "-k", "-s", "/tmp/base.iso"]).unwrap();
        assert!(cli.extract_only);
        assert!(cli.keep_workdir);
        assert!(cli.sanity_test);
        assert_eq!(cli.image, PathBuf::from("/tmp/base.iso"));
    }

    #[test]
    fn flags_default_off() {
        let cli = Cli::try_parse_from(["autoiso", "base.iso"]).unwrap();
        assert!(!cli.extract_only);
        assert!(!cli.keep_workdir);
        assert!(!cli.sanity_test);
    }

    #[test]
    fn long_flags_are_accepted() {
        let cli = Cli::try_parse_from([
            "autoiso",
            "--extract-only",
            "--keep-workdir",
            "base.iso",
        ])
        .unwrap();
        assert!(cli.extract_only);
        assert!(cli.keep_workdir);
        assert!(!cli.sanity_test);
    }

    #[test]
    fn image_argument_is_required() {
        assert!(Cli::try_parse_from(["autoiso", "-x"]).is_err());
    }

    #[test]
    fn rejects_multiple_images() {
        assert!(Cli::try_parse_from(["autoiso", "a.iso", "b.iso"]).is_err());
    }
}
