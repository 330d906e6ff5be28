//! Canonical input events and the classifier that produces them
//!
//! Raw input arrives from several places: the hardware input bridge (virtual
//! key codes derived from evdev), DOM-style keyboard simulation used during
//! development, and the `{type, value}` shape used by test harnesses. All of
//! them are folded into [`InputEvent`]. Anything unrecognized is dropped -
//! the hardware reports plenty of events the shell has no use for.
//!
//! Dial rotation is a pulse: a tick has no release edge, so only the press
//! half of a rotary key code produces an event.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

// Virtual key codes sent by the device input bridge
const KEY_ENTER: u32 = 28;
const KEY_LEFT: u32 = 105;
const KEY_RIGHT: u32 = 106;
const KEY_BACK: u32 = 158;
const BTN_0: u32 = 256;
const BTN_3: u32 = 259;

/// Coarse input category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Button,
    Dial,
    Touch,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Button => "button",
            InputKind::Dial => "dial",
            InputKind::Touch => "touch",
        })
    }
}

/// Direction of a single dial pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Physical momentary buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    Back,
    /// Preset buttons along the top edge, numbered from 1
    Preset(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Down,
    Up,
}

/// What a touch landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    Grid(usize),
    Status(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputValue {
    Dial(DialDirection),
    /// Dial click
    Select,
    Button { button: Button, edge: ButtonEdge },
    Tap(TapTarget),
}

/// A normalized input event, consumed within one dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub value: InputValue,
    pub at: Instant,
}

impl InputEvent {
    pub fn new(value: InputValue, at: Instant) -> Self {
        Self { value, at }
    }

    pub fn dial(direction: DialDirection, at: Instant) -> Self {
        Self::new(InputValue::Dial(direction), at)
    }

    pub fn button(button: Button, edge: ButtonEdge, at: Instant) -> Self {
        Self::new(InputValue::Button { button, edge }, at)
    }

    pub fn kind(&self) -> InputKind {
        match self.value {
            InputValue::Dial(_) | InputValue::Select => InputKind::Dial,
            InputValue::Button { .. } => InputKind::Button,
            InputValue::Tap(_) => InputKind::Touch,
        }
    }

    /// Canonical string value, as forwarded to applications
    pub fn value_str(&self) -> String {
        match self.value {
            InputValue::Dial(DialDirection::Left) => "left".into(),
            InputValue::Dial(DialDirection::Right) => "right".into(),
            InputValue::Dial(DialDirection::Up) => "up".into(),
            InputValue::Dial(DialDirection::Down) => "down".into(),
            InputValue::Select => "dial_click".into(),
            InputValue::Button {
                button: Button::Back,
                edge: ButtonEdge::Down,
            } => "back_down".into(),
            InputValue::Button {
                button: Button::Back,
                edge: ButtonEdge::Up,
            } => "back_up".into(),
            InputValue::Button {
                button: Button::Preset(n),
                edge: ButtonEdge::Down,
            } => format!("preset{}", n),
            InputValue::Button {
                button: Button::Preset(n),
                edge: ButtonEdge::Up,
            } => format!("preset{}_up", n),
            InputValue::Tap(TapTarget::Grid(i)) => format!("grid:{}", i),
            InputValue::Tap(TapTarget::Status(i)) => format!("status:{}", i),
        }
    }
}

/// Raw input as delivered by the transport, before classification
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawInput {
    /// Hardware input bridge
    Bridge {
        #[serde(rename = "deviceId", default)]
        device_id: Option<String>,
        #[serde(rename = "keyCode")]
        key_code: u32,
        #[serde(rename = "isPressed")]
        is_pressed: bool,
    },
    /// Keyboard simulation (DOM key names)
    Key { key: String, pressed: bool },
    /// Simulated hardware / test harness
    Simulated {
        #[serde(rename = "type")]
        kind: String,
        value: String,
    },
}

/// Normalize raw input. Returns `None` for input the shell ignores.
pub fn classify(raw: &RawInput, at: Instant) -> Option<InputEvent> {
    let value = match raw {
        RawInput::Bridge { key_code, is_pressed, .. } => classify_key_code(*key_code, *is_pressed)?,
        RawInput::Key { key, pressed } => classify_key(key, *pressed)?,
        RawInput::Simulated { kind, value } => classify_simulated(kind, value)?,
    };
    Some(InputEvent::new(value, at))
}

fn edge(pressed: bool) -> ButtonEdge {
    if pressed {
        ButtonEdge::Down
    } else {
        ButtonEdge::Up
    }
}

fn classify_key_code(code: u32, pressed: bool) -> Option<InputValue> {
    match code {
        KEY_LEFT if pressed => Some(InputValue::Dial(DialDirection::Left)),
        KEY_RIGHT if pressed => Some(InputValue::Dial(DialDirection::Right)),
        KEY_ENTER if pressed => Some(InputValue::Select),
        KEY_BACK => Some(InputValue::Button { button: Button::Back, edge: edge(pressed) }),
        BTN_0..=BTN_3 => Some(InputValue::Button {
            button: Button::Preset((code - BTN_0 + 1) as u8),
            edge: edge(pressed),
        }),
        _ => None,
    }
}

fn classify_key(key: &str, pressed: bool) -> Option<InputValue> {
    match key {
        "ArrowLeft" if pressed => Some(InputValue::Dial(DialDirection::Left)),
        "ArrowRight" if pressed => Some(InputValue::Dial(DialDirection::Right)),
        "ArrowUp" if pressed => Some(InputValue::Dial(DialDirection::Up)),
        "ArrowDown" if pressed => Some(InputValue::Dial(DialDirection::Down)),
        "Enter" if pressed => Some(InputValue::Select),
        "Escape" | "Backspace" => Some(InputValue::Button {
            button: Button::Back,
            edge: edge(pressed),
        }),
        "1" | "2" | "3" | "4" => {
            let n = key.parse::<u8>().ok()?;
            Some(InputValue::Button {
                button: Button::Preset(n),
                edge: edge(pressed),
            })
        }
        _ => None,
    }
}

fn classify_simulated(kind: &str, value: &str) -> Option<InputValue> {
    match kind {
        "dial" => match value {
            "left" => Some(InputValue::Dial(DialDirection::Left)),
            "right" => Some(InputValue::Dial(DialDirection::Right)),
            "up" => Some(InputValue::Dial(DialDirection::Up)),
            "down" => Some(InputValue::Dial(DialDirection::Down)),
            "click" | "dial_click" => Some(InputValue::Select),
            _ => None,
        },
        "button" => match value {
            "dial_click" => Some(InputValue::Select),
            "back_down" => Some(InputValue::Button {
                button: Button::Back,
                edge: ButtonEdge::Down,
            }),
            "back_up" => Some(InputValue::Button {
                button: Button::Back,
                edge: ButtonEdge::Up,
            }),
            other => parse_preset(other),
        },
        "touch" => {
            let (target, index) = value.split_once(':')?;
            let index = index.parse::<usize>().ok()?;
            match target {
                "grid" => Some(InputValue::Tap(TapTarget::Grid(index))),
                "status" => Some(InputValue::Tap(TapTarget::Status(index))),
                _ => None,
            }
        }
        _ => None,
    }
}

/// "preset2" is a press, "preset2_up" its release
fn parse_preset(value: &str) -> Option<InputValue> {
    let rest = value.strip_prefix("preset")?;
    let (number, edge) = match rest.strip_suffix("_up") {
        Some(n) => (n, ButtonEdge::Up),
        None => (rest, ButtonEdge::Down),
    };
    let n = number.parse::<u8>().ok().filter(|n| (1..=4).contains(n))?;
    Some(InputValue::Button { button: Button::Preset(n), edge })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<InputValue> {
        let raw: RawInput = serde_json::from_str(json).unwrap();
        classify(&raw, Instant::now()).map(|e| e.value)
    }

    #[test]
    fn test_bridge_dial_is_pulse() {
        assert_eq!(
            parse(r#"{"deviceId":"input-bridge","keyCode":106,"isPressed":true}"#),
            Some(InputValue::Dial(DialDirection::Right))
        );
        // Release half of the tick is dropped
        assert_eq!(parse(r#"{"deviceId":"input-bridge","keyCode":106,"isPressed":false}"#), None);
    }

    #[test]
    fn test_bridge_back_has_both_edges() {
        assert_eq!(
            parse(r#"{"keyCode":158,"isPressed":true}"#),
            Some(InputValue::Button { button: Button::Back, edge: ButtonEdge::Down })
        );
        assert_eq!(
            parse(r#"{"keyCode":158,"isPressed":false}"#),
            Some(InputValue::Button { button: Button::Back, edge: ButtonEdge::Up })
        );
    }

    #[test]
    fn test_bridge_presets() {
        assert_eq!(
            parse(r#"{"keyCode":256,"isPressed":true}"#),
            Some(InputValue::Button { button: Button::Preset(1), edge: ButtonEdge::Down })
        );
        assert_eq!(
            parse(r#"{"keyCode":259,"isPressed":false}"#),
            Some(InputValue::Button { button: Button::Preset(4), edge: ButtonEdge::Up })
        );
    }

    #[test]
    fn test_unknown_key_code_dropped() {
        assert_eq!(parse(r#"{"keyCode":42,"isPressed":true}"#), None);
    }

    #[test]
    fn test_keyboard_simulation() {
        assert_eq!(
            parse(r#"{"key":"ArrowUp","pressed":true}"#),
            Some(InputValue::Dial(DialDirection::Up))
        );
        assert_eq!(parse(r#"{"key":"ArrowUp","pressed":false}"#), None);
        assert_eq!(parse(r#"{"key":"Enter","pressed":true}"#), Some(InputValue::Select));
        assert_eq!(
            parse(r#"{"key":"Escape","pressed":false}"#),
            Some(InputValue::Button { button: Button::Back, edge: ButtonEdge::Up })
        );
        assert_eq!(parse(r#"{"key":"q","pressed":true}"#), None);
    }

    #[test]
    fn test_simulated_shapes() {
        assert_eq!(
            parse(r#"{"type":"dial","value":"left"}"#),
            Some(InputValue::Dial(DialDirection::Left))
        );
        assert_eq!(parse(r#"{"type":"dial","value":"click"}"#), Some(InputValue::Select));
        assert_eq!(
            parse(r#"{"type":"touch","value":"grid:1"}"#),
            Some(InputValue::Tap(TapTarget::Grid(1)))
        );
        assert_eq!(
            parse(r#"{"type":"button","value":"preset3_up"}"#),
            Some(InputValue::Button { button: Button::Preset(3), edge: ButtonEdge::Up })
        );
        assert_eq!(parse(r#"{"type":"button","value":"preset9"}"#), None);
        assert_eq!(parse(r#"{"type":"touch","value":"grid:x"}"#), None);
        assert_eq!(parse(r#"{"type":"wheel","value":"left"}"#), None);
    }

    #[test]
    fn test_canonical_strings() {
        let now = Instant::now();
        let event = InputEvent::button(Button::Back, ButtonEdge::Down, now);
        assert_eq!(event.kind(), InputKind::Button);
        assert_eq!(event.value_str(), "back_down");

        let click = InputEvent::new(InputValue::Select, now);
        assert_eq!(click.kind(), InputKind::Dial);
        assert_eq!(click.value_str(), "dial_click");
    }
}
