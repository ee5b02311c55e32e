//! First-boot sanity-test payload (the `-s` flag).
//!
//! Installs a desktop autostart that waits for the network, pulls in
//! the checkbox sanity tooling and runs the smoke-test plan on the
//! freshly provisioned machine, then opens the submission report.

use anyhow::Result;
use std::path::Path;

use crate::common::write_file_mode;
use crate::config::Config;

/// Script run at first boot from the desktop autostart entry.
fn firstboot_script(config: &Config) -> String {
    format!(
        "#!/bin/bash

set -x

while true ; do
  sleep 10
  ping -c 3 8.8.8.8 && break # ideally wired network works, use it.
  sleep 10
  if [ -e /etc/oem-config-hack/connect-wifi ]; then
    bash /etc/oem-config-hack/connect-wifi
  else
    echo Wired network not working and wifi not available, Quit!
    bash
    exit
  fi
done

if ! dpkg-query -W prepare-checkbox-sanity; then
  sudo add-apt-repository -y ppa:checkbox-dev/ppa
  sudo apt install -y prepare-checkbox-sanity
  sudo reboot
  exit
fi

if [ -e ~/.config/autostart/oem-dev-firstboot.desktop ]; then
  rm ~/.config/autostart/oem-dev-firstboot.desktop
fi

checkbox-run-plan pc-sanity-smoke-test --checkbox-conf /home/{user}/.config/checkbox.conf -b

sleep 3

gio open ~/.local/share/checkbox-ng/submission_*.html

bash
",
        user = config.username,
    )
}

/// Installs the autostart entry and checkbox configuration for the
/// user given as `$1`.
const AUTOSTART_SCRIPT: &str = r#"#!/bin/bash
set -x
mkdir -p "/home/$1/.config/autostart/"
cat > /home/$1/.config/autostart/oem-dev-firstboot.desktop << EOF
[Desktop Entry]
Version=1.0
Encoding=UTF-8
Name=Local Sanity
Type=Application
Terminal=true
Exec=/usr/bin/oem-dev-firstboot
Categories=System;Settings
EOF
cat > /home/$1/.config/checkbox.conf <<EOF
[environment]
ROUTERS = multiple
OPEN_N_SSID = ubuntu-cert-n-open
OPEN_BG_SSID = ubuntu-cert-bg-open
OPEN_AC_SSID = ubuntu-cert-ac-open
OPEN_AX_SSID = ubuntu-cert-ax-open
WPA_N_SSID = ubuntu-cert-n-wpa
WPA_BG_SSID = ubuntu-cert-bg-wpa
WPA_AC_SSID = ubuntu-cert-ac-wpa
WPA_AX_SSID = ubuntu-cert-ax-wpa
WPA_N_PSK = insecure
WPA_BG_PSK = insecure
WPA_AC_PSK = insecure
WPA_AX_PSK = insecure
SERVER_IPERF = 192.168.1.99
TEST_TARGET_IPERF = 192.168.1.99
BTDEVADDR = 34:13:E8:9A:52:12

# Transfer server
TRANSFER_SERVER = cdimage.ubuntu.com
EOF
touch "/home/$1/.config/gnome-initial-setup-done"
chown -R "$1.$1" "/home/$1/.config"
"#;

/// Post-install hook wiring the autostart for the OEM account.
fn postinstall_hook(config: &Config) -> String {
    format!(
        "#!/bin/bash\nset -x\n/usr/bin/oem-dev-firstboot-autostart {}\n",
        config.username
    )
}

/// Write the sanity-test payload into the squashfs copy.
pub fn install(squash_tree: &Path, config: &Config) -> Result<()> {
    write_file_mode(
        squash_tree.join("usr/bin/oem-dev-firstboot"),
        firstboot_script(config),
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("usr/bin/oem-dev-firstboot-autostart"),
        AUTOSTART_SCRIPT,
        0o775,
    )?;
    write_file_mode(
        squash_tree.join("usr/lib/oem-config/post-install/oem-dev-firstboot"),
        postinstall_hook(config),
        0o775,
    )?;
    Ok(())
}
