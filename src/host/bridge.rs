//! Messages crossing the application isolation boundary
//!
//! Both directions are closed sets. Inbound messages come from lower-trust
//! embedded content, so they are checked against the allow-list, their
//! required fields, and the expected origin before the shell looks at them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;
use crate::input::{InputEvent, InputKind};

/// Application -> shell
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind")]
pub enum InboundMessage {
    /// Whether the application is at its own internal root
    NavState {
        #[serde(rename = "atRoot")]
        at_root: bool,
    },
    /// The application cannot move further up internally
    AtTop,
    /// The user started interacting with an element inside the application
    UiActionStart {
        #[serde(rename = "elementId", default)]
        element_id: Option<String>,
    },
}

const INBOUND_KINDS: &[&str] = &["NavState", "AtTop", "UiActionStart"];

/// Shell -> application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum OutboundMessage {
    /// Raw input forwarded for the application to interpret
    HardwareEvent { data: HardwareData },
    /// Focus ownership changed
    ZoneFocus { active: bool },
    /// Drop any internal highlight; the shell chrome owns focus
    DimFocus,
    /// Navigate back one level internally
    Back,
    ThemeReady,
    Theme { tokens: BTreeMap<String, String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareData {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub value: String,
}

impl OutboundMessage {
    pub fn hardware(event: &InputEvent) -> Self {
        OutboundMessage::HardwareEvent {
            data: HardwareData {
                kind: event.kind(),
                value: event.value_str(),
            },
        }
    }
}

/// Parse and validate an inbound message
pub fn parse_inbound(
    raw: &str,
    origin: &str,
    expected_origin: &str,
) -> Result<InboundMessage, BridgeError> {
    if origin != expected_origin {
        return Err(BridgeError::UnexpectedOrigin {
            expected: expected_origin.to_string(),
            got: origin.to_string(),
        });
    }

    let value: Value = serde_json::from_str(raw)?;
    let kind = value
        .as_object()
        .ok_or(BridgeError::NotAnObject)?
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(BridgeError::MissingKind)?;

    if !INBOUND_KINDS.contains(&kind) {
        return Err(BridgeError::UnknownKind(kind.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}
