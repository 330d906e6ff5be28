//! Launcher entries and the persisted launcher state
//!
//! The registry of installed applications lives elsewhere; it pushes
//! `{id, name, enabled}` lists at us. What the shell keeps is the display
//! order and the user's name/icon overrides, stored as JSON in the state
//! directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An application as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherEntry {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Icon name or URL; rendering is not our concern
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LauncherEntry {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            enabled: true,
            icon: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Persisted launcher ordering and overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherState {
    /// Application ids in display order
    #[serde(default)]
    pub grid_order: Vec<String>,
    #[serde(default)]
    pub name_overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub icon_overrides: BTreeMap<String, String>,
}

impl LauncherState {
    pub fn path_in(state_dir: &Path) -> PathBuf {
        state_dir.join("launcher.json")
    }

    /// Load from file; a missing or unreadable file gives the default state
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(state) => {
                    tracing::info!("Loaded launcher state from {:?}", path);
                    state
                }
                Err(e) => {
                    tracing::warn!("Failed to parse launcher state {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No launcher state at {:?}, starting fresh", path);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Merge the live id set into the stored order: ids that are gone are
    /// pruned, new ids are appended in the order the registry listed them.
    /// Returns true if the order changed.
    pub fn sync_order(&mut self, live: &[LauncherEntry]) -> bool {
        let before = self.grid_order.clone();

        self.grid_order.retain(|id| live.iter().any(|e| &e.id == id));
        for entry in live {
            if !self.grid_order.contains(&entry.id) {
                self.grid_order.push(entry.id.clone());
            }
        }

        self.grid_order != before
    }

    /// Apply the user's overrides to a registry entry
    pub fn apply_overrides(&self, entry: &LauncherEntry) -> LauncherEntry {
        let mut entry = entry.clone();
        if let Some(name) = self.name_overrides.get(&entry.id) {
            entry.display_name = name.clone();
        }
        if let Some(icon) = self.icon_overrides.get(&entry.id) {
            entry.icon = Some(icon.clone());
        }
        entry
    }
}
