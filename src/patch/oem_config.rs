//! OEM first-run (oem-config) payloads dropped into the squashfs copy.
//!
//! These files make the out-of-box experience fully non-interactive:
//! the account, timezone and keyboard answers are preseeded into
//! debconf before the installer asks, and the post-install hooks
//! disable everything that would interrupt an unattended
//! certification run (screen lock, sleep, unattended APT updates,
//! sudo passwords).

use anyhow::Result;
use std::path::Path;

use crate::common::write_file_mode;
use crate::config::Config;

/// Kernel command line flag that switches oem-config to automatic mode.
const GRUB_AUTOMATIC_OEM_CONFIG: &str =
    "GRUB_CMDLINE_LINUX=$(echo $GRUB_CMDLINE_LINUX automatic-oem-config)\n";

/// Reserve an `ubuntu` account for MAAS, cloud-init etc.
const USER_UBUNTU_HOOK: &str = "#!/bin/bash
adduser --disabled-password --gecos \"\" ubuntu
adduser ubuntu sudo
";

/// Keep the session awake and unlocked for the whole test run.
const GSCHEMA_OVERRIDE_HOOK: &str = "#!/bin/bash
cat <<EOF >> /usr/share/glib-2.0/schemas/certification.gschema.override
[org.gnome.settings-daemon.plugins.power]
idle-dim=false
#sleep-display-ac=0
sleep-inactive-ac-timeout=0
sleep-inactive-battery-timeout=0
[org.gnome.desktop.session]
idle-delay=0
[org.gnome.desktop.screensaver]
ubuntu-lock-on-suspend=false
lock-enabled=false
idle-activation-enabled=false
EOF

glib-compile-schemas /usr/share/glib-2.0/schemas
";

/// Switch APT update automation to manual so nothing downloads or
/// reboots mid-certification.
const DISABLE_UNATTENDED_UPDATES_HOOK: &str = "#!/usr/bin/python3
import softwareproperties
from softwareproperties import SoftwareProperties
import os

# given
#  euid,eguid 1000,1000
#  ruid,rguid 0, 0
# we need to seteuid to 0 so we have permission.
os.seteuid(0)
os.setegid(0)

s = SoftwareProperties.SoftwareProperties()
s.set_update_automation_level(softwareproperties.UPDATE_MANUAL)

print(\"OK\")
";

const SUDOERS_NOPASSWD: &str = "%sudo ALL=(ALL:ALL) NOPASSWD: ALL\n";

/// debconf answers for the OOBE so first boot never prompts.
pub fn oobe_preseed(config: &Config) -> String {
    format!(
        "#!/bin/bash
cat <<EOF | sudo debconf-communicate ubiquity
SET passwd/user-fullname\t{user}
FSET passwd/user-fullname seen true
SET passwd/username\t{user}
FSET passwd/username\tseen true
SET passwd/user-password\t{user}
FSET passwd/user-password\tseen true
SET passwd/user-password-again\t{user}
FSET passwd/user-password-again\tseen true
SET passwd/auto-login\ttrue
FSET passwd/auto-login\tseen true
SET time/zone\t{timezone}
FSET time/zone\tseen true
EOF

cat <<EOF | sudo debconf-communicate keyboard-configuration
SET keyboard-configuration/xkb-keymap {keyboard}
FSET keyboard-configuration/xkb-keymap seen true
SET keyboard-configuration/layoutcode {keyboard}
FSET keyboard-configuration/layoutcode seen true
SET keyboard-configuration/layout\t{label}
FSET keyboard-configuration/layout\tseen true
SET keyboard-configuration/variant\t{label}
FSET keyboard-configuration/variant\tseen true
EOF
",
        user = config.username,
        timezone = config.timezone,
        keyboard = config.keyboard,
        label = config.keyboard_label,
    )
}

/// Write every oem-config payload into the squashfs copy.
pub fn install(squash_tree: &Path, config: &Config) -> Result<()> {
    write_file_mode(
        squash_tree.join("usr/lib/oem-config/pre-install/oobe-preseed"),
        oobe_preseed(config),
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("etc/default/grub.d/automatic-oem-config.cfg"),
        GRUB_AUTOMATIC_OEM_CONFIG,
        0o664,
    )?;
    write_file_mode(
        squash_tree.join("usr/lib/oem-config/post-install/u-ubuntu"),
        USER_UBUNTU_HOOK,
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("usr/lib/oem-config/post-install/gconf-modification"),
        GSCHEMA_OVERRIDE_HOOK,
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("usr/lib/oem-config/post-install/oem-disable-uattn"),
        DISABLE_UNATTENDED_UPDATES_HOOK,
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("etc/sudoers.d/oem-config-hack-nopwd"),
        SUDOERS_NOPASSWD,
        0o664,
    )?;
    Ok(())
}
