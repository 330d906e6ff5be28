//! Shell state - focus zones and input routing
//!
//! Components:
//! - Status bar (top strip, focusable)
//! - Launcher grid (home screen)
//! - Active application (hosted in an isolated frame)
//!
//! All runtime state lives in [`Shell`], which the event loop owns and drives
//! one event at a time. Nothing in here returns an error to the loop: bad
//! input is dropped, boundary failures fall back to a safe zone.

pub mod app_grid;
pub mod apps;
pub mod focus;
pub mod status_bar;


use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ShellConfig;
use crate::host::bridge::{InboundMessage, OutboundMessage};
use crate::host::{AppHost, FrameFactory};
use crate::input::{
    classify, Button, ButtonEdge, DialDirection, DialThrottle, InputEvent, InputValue, PressAction,
    PressDetector, RawInput, TapTarget,
};
use crate::timers::{TimerId, Timers};
use app_grid::LauncherGrid;
use apps::{LauncherEntry, LauncherState};
use focus::{dial_transition, FocusZone, Transition};
use status_bar::{StatusBar, StatusItem};

pub struct Shell {
    config: ShellConfig,
    zone: FocusZone,
    grid: LauncherGrid,
    status: StatusBar,
    host: AppHost,
    back: PressDetector,
    throttle: DialThrottle,
    timers: Timers,
    launcher_state: LauncherState,
    /// Where launcher state is saved; `None` keeps it in memory
    state_path: Option<PathBuf>,
    /// Session generation waiting on a forwarded Back
    back_pending: Option<u64>,
}

impl Shell {
    pub fn new(
        config: ShellConfig,
        factory: Box<dyn FrameFactory>,
        launcher_state: LauncherState,
        state_path: Option<PathBuf>,
    ) -> Self {
        Self {
            zone: FocusZone::Grid,
            grid: LauncherGrid::new(),
            status: StatusBar::new(config.status_items.clone()),
            host: AppHost::new(factory, config.app_origin.clone()),
            back: PressDetector::new(Button::Back, config.long_press()),
            throttle: DialThrottle::new(config.dial_throttle()),
            timers: Timers::new(),
            launcher_state,
            state_path,
            back_pending: None,
            config,
        }
    }

    /// Start periodic work (status bar clock)
    pub fn start(&mut self, now: Instant) {
        self.status.update_clock(chrono::Local::now());
        self.timers.arm(TimerId::ClockTick, now + self.config.clock_tick());
        info!(zone = %self.zone, "Shell started");
    }

    pub fn zone(&self) -> FocusZone {
        self.zone
    }

    pub fn grid(&self) -> &LauncherGrid {
        &self.grid
    }

    pub fn status_bar(&self) -> &StatusBar {
        &self.status
    }

    pub fn host(&self) -> &AppHost {
        &self.host
    }

    pub fn launcher_state(&self) -> &LauncherState {
        &self.launcher_state
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Registry pushed a new application list
    pub fn set_entries(&mut self, entries: &[LauncherEntry]) {
        if self.grid.set_entries(entries, &mut self.launcher_state) {
            self.save_launcher_state();
        }
        info!(count = self.grid.len(), "Launcher updated");
    }

    fn save_launcher_state(&self) {
        let Some(path) = &self.state_path else {
            return;
        };
        if let Err(e) = self.launcher_state.save(path) {
            warn!("Failed to save launcher state to {:?}: {}", path, e);
        }
    }

    /// Classify and handle raw input
    pub fn handle_raw(&mut self, raw: &RawInput, at: Instant) {
        match classify(raw, at) {
            Some(event) => self.handle_input(event),
            None => debug!(?raw, "Dropping unrecognized input"),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        // A long press whose deadline passed before this event resolves first
        self.fire_timers(event.at);

        match event.value {
            InputValue::Dial(direction) => {
                if !self.throttle.accept(event.at) {
                    debug!(?direction, "Dial pulse throttled");
                    return;
                }
                if self.recover_focus() {
                    debug!(?direction, "Dial pulse dropped during focus recovery");
                    return;
                }
                self.handle_dial(direction, &event);
            }
            InputValue::Select => self.handle_select(&event),
            InputValue::Button { button: Button::Back, edge: ButtonEdge::Down } => {
                self.back.press_down(event.at, &mut self.timers);
            }
            InputValue::Button { button: Button::Back, edge: ButtonEdge::Up } => {
                if let Some(action) = self.back.press_up(&mut self.timers) {
                    self.handle_back(action, event.at);
                }
            }
            InputValue::Button { button: Button::Preset(n), edge: ButtonEdge::Down } => {
                self.handle_preset(n, &event);
            }
            InputValue::Button { button: Button::Preset(_), edge: ButtonEdge::Up } => {}
            InputValue::Tap(target) => self.handle_tap(target, event.at),
        }
    }

    /// Fire every timer due at or before `now`
    pub fn fire_timers(&mut self, now: Instant) {
        for (id, _deadline) in self.timers.take_due(now) {
            match id {
                TimerId::LongPress(Button::Back) => {
                    if let Some(action) = self.back.on_timer() {
                        self.handle_back(action, now);
                    }
                }
                TimerId::LongPress(button) => {
                    debug!(?button, "Long press timer for untracked button")
                }
                TimerId::BackFallback => {
                    if self.back_pending.take().is_some_and(|g| self.host.generation() == Some(g)) {
                        warn!("Application did not answer Back, returning home");
                        self.go_home();
                    }
                }
                TimerId::ClockTick => {
                    self.status.update_clock(chrono::Local::now());
                    self.timers.arm(TimerId::ClockTick, now + self.config.clock_tick());
                }
            }
        }
    }

    /// Message from the embedded application running as session `generation`
    pub fn handle_app_message(&mut self, generation: u64, raw: &str, origin: &str) {
        let message = match self.host.receive(generation, raw, origin) {
            Ok(message) => message,
            Err(e) => {
                debug!(%e, origin, "Dropping application message");
                return;
            }
        };

        match message {
            InboundMessage::NavState { at_root } => {
                self.clear_back_pending();
                self.host.set_at_root(at_root);
                debug!(at_root, "Application navigation state");
            }
            InboundMessage::AtTop => {
                self.clear_back_pending();
                self.host.set_at_root(true);
                // Complete the user's "up" in one motion
                if self.zone == FocusZone::Application {
                    self.set_zone(FocusZone::StatusBar);
                }
            }
            InboundMessage::UiActionStart { element_id } => {
                debug!(?element_id, "Application UI action");
                if self.zone != FocusZone::Application && self.host.is_running() {
                    self.set_zone(FocusZone::Application);
                }
            }
        }
    }

    /// The frame for `generation` finished loading
    pub fn frame_loaded(&mut self, generation: u64) {
        self.host.frame_loaded(generation, &self.config.theme);
    }

    /// The frame for `generation` failed to load; fall back to the launcher
    pub fn frame_failed(&mut self, generation: u64) {
        if self.host.frame_failed(generation) {
            self.go_home();
        }
    }

    /// Launch the grid entry at `index`
    pub fn launch(&mut self, index: usize) {
        let Some(entry) = self.grid.entry(index) else {
            debug!(index, "No launcher entry to launch");
            return;
        };
        let app_id = entry.id.clone();
        let url = self.config.entry_url(&app_id);

        // Leaving the old application before it goes away keeps notifications ordered
        if self.zone == FocusZone::Application {
            self.set_zone(FocusZone::Grid);
        }
        self.back_pending = None;
        self.timers.cancel(TimerId::BackFallback);

        match self.host.launch(&app_id, &url) {
            Ok(_) => self.set_zone(FocusZone::Application),
            Err(e) => {
                warn!(app_id, %e, "Launch failed, staying on launcher");
                self.set_zone(FocusZone::Grid);
            }
        }
    }

    /// Tear down any application and focus the launcher
    pub fn go_home(&mut self) {
        self.clear_back_pending();
        if self.zone == FocusZone::Application {
            self.set_zone(FocusZone::Grid);
        }
        self.host.teardown();
        self.set_zone(FocusZone::Grid);
    }

    fn clear_back_pending(&mut self) {
        self.back_pending = None;
        self.timers.cancel(TimerId::BackFallback);
    }

    fn set_zone(&mut self, zone: FocusZone) {
        if zone == self.zone {
            return;
        }
        if zone == FocusZone::Application && !self.host.is_running() {
            debug!("No running application to focus");
            return;
        }

        let previous = self.zone;
        self.zone = zone;
        info!(from = %previous, to = %zone, "Focus zone changed");

        if previous == FocusZone::Application {
            self.host.post(&OutboundMessage::ZoneFocus { active: false });
            if zone == FocusZone::StatusBar {
                self.host.post(&OutboundMessage::DimFocus);
            }
        }
        if zone == FocusZone::Application {
            self.host.post(&OutboundMessage::ZoneFocus { active: true });
        }
    }

    /// Put focus back somewhere renderable if it was lost. Returns true when
    /// it had to recover.
    fn recover_focus(&mut self) -> bool {
        let renderable = match self.zone {
            FocusZone::Grid => !self.grid.is_empty(),
            FocusZone::StatusBar => self.status.has_highlight(),
            FocusZone::Application => self.host.is_running(),
        };
        if renderable {
            return false;
        }

        warn!(zone = %self.zone, "Focus lost, recovering to status bar");
        if self.host.has_session() && !self.host.is_running() {
            self.host.teardown();
        }
        self.zone = FocusZone::StatusBar;
        true
    }

    fn handle_dial(&mut self, direction: DialDirection, event: &InputEvent) {
        let transition = dial_transition(
            self.zone,
            direction,
            self.host.is_running(),
            self.host.at_root(),
        );
        match transition {
            Transition::Stay => {}
            Transition::MoveTo(zone) => self.set_zone(zone),
            Transition::MoveHighlight(delta) => self.grid.move_highlight(delta),
            Transition::CycleStatus(delta) => self.status.cycle(delta),
            Transition::ForwardToApp => {
                self.host.post(&OutboundMessage::hardware(event));
            }
        }
    }

    fn handle_select(&mut self, event: &InputEvent) {
        match self.zone {
            FocusZone::StatusBar => self.activate_status_item(event.at),
            FocusZone::Grid => self.launch(self.grid.highlighted_index()),
            FocusZone::Application => {
                self.host.post(&OutboundMessage::hardware(event));
            }
        }
    }

    fn activate_status_item(&mut self, at: Instant) {
        match self.status.focused_item() {
            Some(StatusItem::Back) => self.handle_back(PressAction::Short, at),
            Some(StatusItem::Home) => self.handle_back(PressAction::Long, at),
            None => {}
        }
    }

    fn handle_back(&mut self, action: PressAction, at: Instant) {
        match action {
            PressAction::Short => self.back_short(at),
            PressAction::Long => {
                info!("Long back press, returning home");
                self.go_home();
            }
            PressAction::LongReleased => debug!("Back released after long press"),
        }
    }

    fn back_short(&mut self, at: Instant) {
        if !self.host.is_running() {
            return;
        }
        if self.host.at_root() {
            self.go_home();
            return;
        }

        // The application decides what back means internally
        if self.host.post(&OutboundMessage::Back) {
            let fallback = self.config.back_fallback();
            if let (Some(timeout), Some(generation)) = (fallback, self.host.generation()) {
                self.back_pending = Some(generation);
                self.timers.arm(TimerId::BackFallback, at + timeout);
            }
        }
    }

    fn handle_preset(&mut self, n: u8, event: &InputEvent) {
        if self.zone == FocusZone::Application && self.host.is_running() {
            self.host.post(&OutboundMessage::hardware(event));
            return;
        }
        let index = usize::from(n.saturating_sub(1));
        if self.grid.select(index) {
            self.launch(index);
        } else {
            debug!(preset = n, "No launcher entry for preset");
        }
    }

    fn handle_tap(&mut self, target: TapTarget, at: Instant) {
        match target {
            TapTarget::Grid(index) => {
                if !self.grid.select(index) {
                    debug!(index, "Tap outside launcher entries");
                    return;
                }
                self.set_zone(FocusZone::Grid);
                self.launch(index);
            }
            TapTarget::Status(index) => {
                if !self.status.focus(index) {
                    debug!(index, "Tap outside status items");
                    return;
                }
                self.set_zone(FocusZone::StatusBar);
                self.activate_status_item(at);
            }
        }
    }
}
