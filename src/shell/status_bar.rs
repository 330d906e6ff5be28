//! Status bar - the focusable strip across the top of the screen

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusItem {
    /// Same as a short press of the back button
    Back,
    /// Same as a long press: straight back to the launcher
    Home,
}

pub struct StatusBar {
    items: Vec<StatusItem>,
    focused: usize,
    clock: String,
}

impl StatusBar {
    /// An empty item list falls back to a single back item so the bar can
    /// always hold focus.
    pub fn new(items: Vec<StatusItem>) -> Self {
        let items = if items.is_empty() { vec![StatusItem::Back] } else { items };
        Self {
            items,
            focused: 0,
            clock: String::new(),
        }
    }

    pub fn items(&self) -> &[StatusItem] {
        &self.items
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn focused_item(&self) -> Option<StatusItem> {
        self.items.get(self.focused).copied()
    }

    /// Whether the bar can show a highlight when focused
    pub fn has_highlight(&self) -> bool {
        self.focused < self.items.len()
    }

    /// Cycle focus with wraparound. Single-item bars don't move.
    pub fn cycle(&mut self, delta: isize) {
        let count = self.items.len() as isize;
        if count <= 1 {
            return;
        }
        self.focused = (self.focused as isize + delta).rem_euclid(count) as usize;
    }

    pub fn focus(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.focused = index;
            true
        } else {
            false
        }
    }

    pub fn clock(&self) -> &str {
        &self.clock
    }

    pub fn update_clock(&mut self, now: DateTime<Local>) {
        self.clock = now.format("%H:%M").to_string();
    }
}
