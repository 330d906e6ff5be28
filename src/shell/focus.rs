//! Focus zones and the dial transition table
//!
//! | Zone        | up                          | down                      | left/right        |
//! |-------------|-----------------------------|---------------------------|-------------------|
//! | StatusBar   | stay                        | Application, else Grid    | cycle status item |
//! | Grid        | StatusBar                   | Application, else stay    | move highlight    |
//! | Application | StatusBar if at root, else forward | forward            | forward           |

use std::fmt;

use crate::input::DialDirection;

/// Exactly one zone owns focus at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusZone {
    StatusBar,
    #[default]
    Grid,
    Application,
}

impl fmt::Display for FocusZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocusZone::StatusBar => "status-bar",
            FocusZone::Grid => "grid",
            FocusZone::Application => "application",
        })
    }
}

/// What the state machine does with a dial pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    MoveTo(FocusZone),
    MoveHighlight(isize),
    CycleStatus(isize),
    ForwardToApp,
}

pub fn dial_transition(
    zone: FocusZone,
    direction: DialDirection,
    app_running: bool,
    app_at_root: bool,
) -> Transition {
    use DialDirection::*;
    use FocusZone::*;

    match (zone, direction) {
        (StatusBar, Up) => Transition::Stay,
        (StatusBar, Down) if app_running => Transition::MoveTo(Application),
        (StatusBar, Down) => Transition::MoveTo(Grid),
        (StatusBar, Left) => Transition::CycleStatus(-1),
        (StatusBar, Right) => Transition::CycleStatus(1),

        (Grid, Up) => Transition::MoveTo(StatusBar),
        (Grid, Down) if app_running => Transition::MoveTo(Application),
        (Grid, Down) => Transition::Stay,
        (Grid, Left) => Transition::MoveHighlight(-1),
        (Grid, Right) => Transition::MoveHighlight(1),

        (Application, Up) if app_at_root => Transition::MoveTo(StatusBar),
        (Application, _) => Transition::ForwardToApp,
    }
}
