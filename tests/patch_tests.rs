//! Integration tests for the patch stage.
//!
//! These run against a mock extracted squashfs tree; no mounts, no
//! root, no external tools. End-to-end image building is exercised
//! manually.

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use autoiso::config::Config;
use autoiso::patch;

/// Mock squashfs copy with the three installer files the patch stage
/// edits, each carrying the byte patterns the real files carry.
struct MockTree {
    _temp_dir: TempDir,
    squash_tree: PathBuf,
}

impl MockTree {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let squash_tree = temp_dir.path().join("squashrw");

        write(
            &squash_tree.join("usr/lib/ubiquity/bin/ubiquity"),
            "def run_oem_hooks():\n    \"\"\"Run hook scripts from /usr/lib/oem-config/post-install.\"\"\"\n    hookdir = '/usr/lib/oem-config/post-install'\n\ndef main():\n    if oem_config:\n        run_oem_hooks()\n\n    if args.automatic:\n        pass\n",
        );
        write(
            &squash_tree.join("usr/lib/ubiquity/plugins/ubuntu-recovery.py"),
            "bypass = os.path.exists(\"/cdrom/.oem/bypass_create_media\")\n",
        );
        write(
            &squash_tree.join("usr/lib/ubiquity/plugins/ubuntu-bootstrap.py"),
            "gi.require_version('UDisks', '2.0')\nif True:\n    if True:\n        if True:\n            if True:\n                self.interactive_recovery.set_sensitive(False)\n                self.automated_recovery.set_sensitive(False)\nelif rec_type == 'hdd' or rec_type == 'dev':\n    pass\nif x or rec_type == 'hdd' or rec_type == 'dev':\n    pass\nif rpconf.rec_type == \"factory\":\n    pass\n",
        );

        Self {
            _temp_dir: temp_dir,
            squash_tree,
        }
    }

    /// Snapshot of every file's bytes, keyed by relative path.
    fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(&self.squash_tree, &self.squash_tree, &mut files);
        files
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent");
    fs::write(path, content).expect("Failed to write mock file");
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            files.insert(rel, fs::read(&path).expect("Failed to read file"));
        }
    }
}

fn mode_of(path: &Path) -> u32 {
    fs::metadata(path)
        .expect("Expected file to exist")
        .permissions()
        .mode()
        & 0o777
}

#[test]
fn apply_all_writes_oem_config_payloads() {
    let tree = MockTree::new();
    patch::apply_all(&tree.squash_tree, &Config::default(), false).unwrap();

    let preseed = tree
        .squash_tree
        .join("usr/lib/oem-config/pre-install/oobe-preseed");
    assert_eq!(mode_of(&preseed), 0o775);
    let content = fs::read_to_string(&preseed).unwrap();
    assert!(content.contains("SET passwd/auto-login\ttrue"));
    assert!(content.contains("SET time/zone\tAsia/Shanghai"));

    let grub = tree
        .squash_tree
        .join("etc/default/grub.d/automatic-oem-config.cfg");
    assert_eq!(mode_of(&grub), 0o664);
    assert!(fs::read_to_string(&grub)
        .unwrap()
        .contains("automatic-oem-config"));

    for hook in ["u-ubuntu", "gconf-modification", "oem-disable-uattn"] {
        let path = tree
            .squash_tree
            .join("usr/lib/oem-config/post-install")
            .join(hook);
        assert_eq!(mode_of(&path), 0o775, "{} should be executable", hook);
    }

    let sudoers = tree.squash_tree.join("etc/sudoers.d/oem-config-hack-nopwd");
    assert_eq!(mode_of(&sudoers), 0o664);
    assert_eq!(
        fs::read_to_string(&sudoers).unwrap(),
        "%sudo ALL=(ALL:ALL) NOPASSWD: ALL\n"
    );
}

#[test]
fn sanity_payload_only_written_when_requested() {
    let without = MockTree::new();
    patch::apply_all(&without.squash_tree, &Config::default(), false).unwrap();
    assert!(!without
        .squash_tree
        .join("usr/bin/oem-dev-firstboot")
        .exists());

    let with = MockTree::new();
    patch::apply_all(&with.squash_tree, &Config::default(), true).unwrap();
    for path in [
        "usr/bin/oem-dev-firstboot",
        "usr/bin/oem-dev-firstboot-autostart",
        "usr/lib/oem-config/post-install/oem-dev-firstboot",
    ] {
        assert_eq!(mode_of(&with.squash_tree.join(path)), 0o775, "{}", path);
    }
}

#[test]
fn installer_files_are_rewritten() {
    let tree = MockTree::new();
    patch::apply_all(&tree.squash_tree, &Config::default(), false).unwrap();

    let ubiquity = fs::read_to_string(
        tree.squash_tree.join("usr/lib/ubiquity/bin/ubiquity"),
    )
    .unwrap();
    assert!(ubiquity.contains("def run_oem_hooks(hookdir):"));
    assert!(ubiquity.contains("run_oem_hooks('/usr/lib/oem-config/pre-install')"));

    let recovery = fs::read_to_string(
        tree.squash_tree
            .join("usr/lib/ubiquity/plugins/ubuntu-recovery.py"),
    )
    .unwrap();
    assert!(recovery.contains("or ('UBIQUITY_AUTOMATIC' in os.environ)"));

    let bootstrap = fs::read_to_string(
        tree.squash_tree
            .join("usr/lib/ubiquity/plugins/ubuntu-bootstrap.py"),
    )
    .unwrap();
    assert!(bootstrap.contains("from gi.repository import GLib"));
    assert!(bootstrap.contains("(rec_type == 'dev' and self.stage == 2)"));
    assert!(bootstrap.contains("(rpconf.rec_type == \"factory\" or rpconf.rec_type == \"dev\")"));

    // Patched installer files keep their executable mode.
    assert_eq!(
        mode_of(&tree.squash_tree.join("usr/lib/ubiquity/bin/ubiquity")),
        0o755
    );
}

#[test]
fn patching_twice_is_a_no_op() {
    let tree = MockTree::new();
    let config = Config::default();

    patch::apply_all(&tree.squash_tree, &config, true).unwrap();
    let first = tree.snapshot();

    patch::apply_all(&tree.squash_tree, &config, true).unwrap();
    let second = tree.snapshot();

    assert_eq!(first, second, "second patch run must change nothing");
}

#[test]
fn configured_account_flows_into_payloads() {
    let tree = MockTree::new();
    let config = Config {
        username: "cert".to_string(),
        timezone: "UTC".to_string(),
        ..Config::default()
    };
    patch::apply_all(&tree.squash_tree, &config, true).unwrap();

    let preseed = fs::read_to_string(
        tree.squash_tree
            .join("usr/lib/oem-config/pre-install/oobe-preseed"),
    )
    .unwrap();
    assert!(preseed.contains("SET passwd/username\tcert"));
    assert!(preseed.contains("SET time/zone\tUTC"));

    let hook = fs::read_to_string(
        tree.squash_tree
            .join("usr/lib/oem-config/post-install/oem-dev-firstboot"),
    )
    .unwrap();
    assert!(hook.contains("/usr/bin/oem-dev-firstboot-autostart cert"));
}

#[test]
fn missing_installer_tree_aborts() {
    let temp_dir = TempDir::new().unwrap();
    let empty = temp_dir.path().join("squashrw");
    fs::create_dir_all(&empty).unwrap();

    let err = patch::apply_all(&empty, &Config::default(), false).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}
