//! Configuration for the generated OEM payloads.
//!
//! The values that appear verbatim inside the generated preseed and
//! first-boot scripts can be overridden from environment variables
//! (a `.env` file in the invoking directory is loaded by `main`).
//! Everything defaults to the values certification images have always
//! shipped with.

use std::collections::HashMap;

pub const DEFAULT_USERNAME: &str = "u";
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_KEYBOARD: &str = "us";
pub const DEFAULT_KEYBOARD_LABEL: &str = "English (US)";

/// Autoiso configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OEM account name. Doubles as the throwaway password and the
    /// account's full name, like the images built by hand did.
    pub username: String,
    /// Timezone preseeded into the OOBE (e.g. "Asia/Shanghai").
    pub timezone: String,
    /// xkb keymap / layout code (e.g. "us").
    pub keyboard: String,
    /// Layout name in the form debconf expects (e.g. "English (US)").
    pub keyboard_label: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    fn from_map(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str, default: &str| -> String {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            username: get("AUTOISO_USERNAME", DEFAULT_USERNAME),
            timezone: get("AUTOISO_TIMEZONE", DEFAULT_TIMEZONE),
            keyboard: get("AUTOISO_KEYBOARD", DEFAULT_KEYBOARD),
            keyboard_label: get("AUTOISO_KEYBOARD_LABEL", DEFAULT_KEYBOARD_LABEL),
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  AUTOISO_USERNAME: {}", self.username);
        println!("  AUTOISO_TIMEZONE: {}", self.timezone);
        println!("  AUTOISO_KEYBOARD: {}", self.keyboard);
        println!("  AUTOISO_KEYBOARD_LABEL: {}", self.keyboard_label);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_hand_built_images() {
        let config = Config::default();
        assert_eq!(config.username, "u");
        assert_eq!(config.timezone, "Asia/Shanghai");
        assert_eq!(config.keyboard, "us");
        assert_eq!(config.keyboard_label, "English (US)");
    }

    #[test]
    fn map_overrides_take_effect() {
        let mut vars = HashMap::new();
        vars.insert("AUTOISO_USERNAME".to_string(), "oem".to_string());
        vars.insert("AUTOISO_TIMEZONE".to_string(), "Europe/London".to_string());
        let config = Config::from_map(&vars);
        assert_eq!(config.username, "oem");
        assert_eq!(config.timezone, "Europe/London");
        // Untouched keys keep their defaults.
        assert_eq!(config.keyboard, "us");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let mut vars = HashMap::new();
        vars.insert("AUTOISO_USERNAME".to_string(), "   ".to_string());
        let config = Config::from_map(&vars);
        assert_eq!(config.username, "u");
    }

    #[test]
    #[serial]
    fn load_reads_process_environment() {
        std::env::set_var("AUTOISO_KEYBOARD", "de");
        std::env::set_var("AUTOISO_KEYBOARD_LABEL", "German");
        let config = Config::load();
        std::env::remove_var("AUTOISO_KEYBOARD");
        std::env::remove_var("AUTOISO_KEYBOARD_LABEL");
        assert_eq!(config.keyboard, "de");
        assert_eq!(config.keyboard_label, "German");
    }
}
