//! Shell configuration loaded from TOML
//!
//! Every field has a default so a missing file (or a partial one) is valid.
//! A file that exists but does not parse is a startup error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shell::status_bar::StatusItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Press duration separating a short back-press from a long one
    pub long_press_ms: u64,
    /// Minimum spacing between accepted dial pulses
    pub dial_throttle_ms: u64,
    /// Status bar clock refresh period
    pub clock_tick_secs: u64,
    /// Force home if an application ignores a forwarded Back (unset = wait forever)
    pub back_fallback_ms: Option<u64>,
    /// Origin applications are served from; inbound messages must match it
    pub app_origin: String,
    /// Status bar items, left to right
    pub status_items: Vec<StatusItem>,
    /// Where launcher state and logs live (defaults to XDG state dir)
    pub state_dir: Option<PathBuf>,
    /// Theme tokens delivered to applications after they load
    pub theme: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 250,
            dial_throttle_ms: 25,
            clock_tick_secs: 30,
            back_fallback_ms: None,
            app_origin: "http://127.0.0.1:3000".to_string(),
            status_items: vec![StatusItem::Back],
            state_dir: None,
            theme: default_theme(),
        }
    }
}

fn default_theme() -> BTreeMap<String, String> {
    [
        ("background", "#000000"),
        ("foreground", "#ffffff"),
        ("accent", "#1db954"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl ShellConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents)?;
                tracing::info!("Loaded shell config from {:?}", path);
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn dial_throttle(&self) -> Duration {
        Duration::from_millis(self.dial_throttle_ms)
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.clock_tick_secs.max(1))
    }

    pub fn back_fallback(&self) -> Option<Duration> {
        self.back_fallback_ms.map(Duration::from_millis)
    }

    /// Entry resource for an application id
    pub fn entry_url(&self, app_id: &str) -> String {
        format!("{}/apps/{}/", self.app_origin.trim_end_matches('/'), app_id)
    }

    /// Resolve the state directory (~/.local/state/dial-shell or /tmp/dial-shell)
    pub fn resolved_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("dial-shell")
    }

    /// Default config file location (~/.config/dial-shell/config.toml)
    pub fn default_path() -> PathBuf {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .unwrap_or_else(|_| PathBuf::from("/etc"))
            .join("dial-shell/config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_timings() {
        let config = ShellConfig::default();
        assert_eq!(config.long_press(), Duration::from_millis(250));
        assert_eq!(config.dial_throttle(), Duration::from_millis(25));
        assert!(config.back_fallback().is_none());
        assert_eq!(config.status_items, vec![StatusItem::Back]);
    }

    #[test]
    fn test_partial_toml() {
        let config: ShellConfig = toml::from_str(
            r#"
            long_press_ms = 400
            status_items = ["back", "home"]
            back_fallback_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.long_press_ms, 400);
        assert_eq!(config.dial_throttle_ms, 25);
        assert_eq!(config.status_items, vec![StatusItem::Back, StatusItem::Home]);
        assert_eq!(config.back_fallback(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.long_press_ms, 250);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "long_press_ms = \"soon\"").unwrap();
        assert!(ShellConfig::load(&path).is_err());
    }

    #[test]
    fn test_entry_url() {
        let mut config = ShellConfig::default();
        config.app_origin = "http://device.local:3000/".to_string();
        assert_eq!(config.entry_url("spotify"), "http://device.local:3000/apps/spotify/");
    }
}
