//! Launcher grid model
//!
//! Holds the ordered, enabled entries and the highlighted index. Layout and
//! tile rendering happen elsewhere.

use super::apps::{LauncherEntry, LauncherState};

#[derive(Debug, Default)]
pub struct LauncherGrid {
    entries: Vec<LauncherEntry>,
    highlighted: usize,
}

impl LauncherGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entries from a registry update. The stored order is synced
    /// in the same call; returns true if it changed and should be saved.
    pub fn set_entries(&mut self, live: &[LauncherEntry], state: &mut LauncherState) -> bool {
        let order_changed = state.sync_order(live);

        self.entries = state
            .grid_order
            .iter()
            .filter_map(|id| live.iter().find(|e| &e.id == id))
            .filter(|e| e.enabled)
            .map(|e| state.apply_overrides(e))
            .collect();

        self.clamp_highlight();
        tracing::debug!(count = self.entries.len(), "Launcher entries updated");
        order_changed
    }

    pub fn entries(&self) -> &[LauncherEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn highlighted_index(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted_entry(&self) -> Option<&LauncherEntry> {
        self.entries.get(self.highlighted)
    }

    pub fn entry(&self, index: usize) -> Option<&LauncherEntry> {
        self.entries.get(index)
    }

    /// Move the highlight, wrapping at both ends. No-op on an empty grid.
    pub fn move_highlight(&mut self, delta: isize) {
        let count = self.entries.len() as isize;
        if count == 0 {
            return;
        }
        self.highlighted = (self.highlighted as isize + delta).rem_euclid(count) as usize;
    }

    /// Highlight `index` if it is a valid entry
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.highlighted = index;
            true
        } else {
            false
        }
    }

    /// Pull an out-of-range highlight back onto the last entry
    pub fn clamp_highlight(&mut self) {
        self.highlighted = self.highlighted.min(self.entries.len().saturating_sub(1));
    }
}
