//! Byte-level patches to the ubiquity installer inside the squashfs
//! copy.
//!
//! Three files are edited, all shipped as Python source, all patched
//! as opaque bytes:
//!
//! - `usr/lib/ubiquity/bin/ubiquity` - teach `run_oem_hooks` to take a
//!   hook directory and run pre-install hooks before argument
//!   handling, so the OOBE preseed runs early enough to matter.
//! - `usr/lib/ubiquity/plugins/ubuntu-recovery.py` - honour
//!   `UBIQUITY_AUTOMATIC` as a bypass for recovery-media creation.
//! - `usr/lib/ubiquity/plugins/ubuntu-bootstrap.py` - auto-advance
//!   dev-mode recovery at stage 1 and treat `dev` like `hdd`/`factory`
//!   in the stage-2 paths.

use anyhow::Result;
use std::fs;
use std::path::Path;

use super::substitute::{contains, patch_file, Substitution};

const UBIQUITY_BIN: &str = "usr/lib/ubiquity/bin/ubiquity";
const RECOVERY_PLUGIN: &str = "usr/lib/ubiquity/plugins/ubuntu-recovery.py";
const BOOTSTRAP_PLUGIN: &str = "usr/lib/ubiquity/plugins/ubuntu-bootstrap.py";

/// Marker showing the UBIQUITY_AUTOMATIC fix already landed in the
/// ubuntu-recovery package (version >= 0.4.9~20.04ouagadougou22).
const RECOVERY_FIX_LANDED: &str = "'UBIQUITY_AUTOMATIC' in os.environ";

const UBIQUITY_SUBS: &[Substitution] = &[
    Substitution::new(
        "def run_oem_hooks():\n    \"\"\"Run hook scripts from /usr/lib/oem-config/post-install.\"\"\"\n    hookdir = '/usr/lib/oem-config/post-install'\n",
        "def run_oem_hooks(hookdir):\n    \"\"\"Run hook scripts from hookdir.\"\"\"",
    ),
    Substitution::new(
        "if oem_config:\n        run_oem_hooks()",
        "if oem_config:\n        run_oem_hooks('/usr/lib/oem-config/post-install')",
    ),
    Substitution::new(
        "if args",
        "if oem_config:\n        run_oem_hooks('/usr/lib/oem-config/pre-install')\n\n    if args",
    ),
];

const RECOVERY_SUBS: &[Substitution] = &[Substitution::new(
    "os.path.exists(\"/cdrom/.oem/bypass_create_media\")",
    "os.path.exists(\"/cdrom/.oem/bypass_create_media\") or ('UBIQUITY_AUTOMATIC' in os.environ)",
)];

const BOOTSTRAP_SUBS: &[Substitution] = &[
    Substitution::new(
        "gi.require_version('UDisks', '2.0')\n",
        "gi.require_version('UDisks', '2.0')\nfrom gi.repository import GLib\n",
    ),
    Substitution::new(
        "self.interactive_recovery.set_sensitive(False)\n                self.automated_recovery.set_sensitive(False)",
        "self.interactive_recovery.set_sensitive(False)\n                self.automated_recovery.set_sensitive(False)\n                if value == \"dev\" and stage == 1:\n                    self.automated_recovery.set_active(True)\n                    self.controller.allow_go_forward(True)\n                    GLib.timeout_add(5000, self.controller.go_forward)\n",
    ),
    Substitution::new(
        "elif rec_type == 'hdd' or rec_type == 'dev':",
        "elif rec_type == 'hdd' or (rec_type == 'dev' and self.stage == 2):",
    ),
    Substitution::new(
        "or rec_type == 'hdd' or rec_type == 'dev':",
        "or rec_type == 'hdd' or (rec_type == 'dev' and self.stage == 2):",
    ),
    Substitution::new(
        "rpconf.rec_type == \"factory\"",
        "(rpconf.rec_type == \"factory\" or rpconf.rec_type == \"dev\")",
    ),
];

pub fn patch_ubiquity(squash_tree: &Path) -> Result<()> {
    patch_file(&squash_tree.join(UBIQUITY_BIN), UBIQUITY_SUBS, 0o755)?;
    Ok(())
}

pub fn patch_recovery(squash_tree: &Path) -> Result<()> {
    let path = squash_tree.join(RECOVERY_PLUGIN);
    let buf = fs::read(&path)?;
    if contains(&buf, RECOVERY_FIX_LANDED.as_bytes()) {
        return Ok(());
    }
    patch_file(&path, RECOVERY_SUBS, 0o755)?;
    Ok(())
}

pub fn patch_bootstrap(squash_tree: &Path) -> Result<()> {
    patch_file(&squash_tree.join(BOOTSTRAP_PLUGIN), BOOTSTRAP_SUBS, 0o755)?;
    Ok(())
}
