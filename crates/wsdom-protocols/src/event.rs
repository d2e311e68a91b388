//! Serialized client events.
//!
//! Every event carries the common [`EventBase`] fields (`type`, `target`,
//! `timestamp`) flattened next to its category-specific fields, in camelCase,
//! matching the shape of the browser event it was captured from.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::node_ref::NodeRef;

/// Fields shared by every serialized event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBase {
    #[serde(rename = "type")]
    pub event_type: String,
    pub target: NodeRef,
    /// Milliseconds since the Unix epoch at capture time.
    pub timestamp: u64,
}

impl EventBase {
    pub fn new(event_type: impl Into<String>, target: NodeRef, timestamp: u64) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            timestamp,
        }
    }
}

/// Modifier key state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifiers {
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(default)]
    pub shift_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    #[serde(flatten)]
    pub base: EventBase,
    pub client_x: f64,
    pub client_y: f64,
    pub button: i16,
    pub buttons: u16,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEvent {
    #[serde(flatten)]
    pub base: EventBase,
    pub key: String,
    pub code: String,
    #[serde(default)]
    pub location: u32,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub is_composing: bool,
    #[serde(default)]
    pub char_code: u32,
    #[serde(default)]
    pub key_code: u32,
    #[serde(default)]
    pub which: u32,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusEvent {
    #[serde(flatten)]
    pub base: EventBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    #[serde(flatten)]
    pub base: EventBase,
    pub value: String,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub is_composing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitEvent {
    #[serde(flatten)]
    pub base: EventBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEvent {
    #[serde(flatten)]
    pub base: EventBase,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub page_x: f64,
    #[serde(default)]
    pub page_y: f64,
    #[serde(default)]
    pub screen_x: f64,
    #[serde(default)]
    pub screen_y: f64,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(flatten)]
    pub base: EventBase,
    pub value: String,
}

/// Fallback for event types without a dedicated shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEvent {
    #[serde(flatten)]
    pub base: EventBase,
}

/// Event category, derived from the event type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Click,
    Keyboard,
    Focus,
    Input,
    Submit,
    Mouse,
    Change,
}

impl EventCategory {
    pub fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "click" => Some(Self::Click),
            "keydown" | "keyup" | "keypress" => Some(Self::Keyboard),
            "focus" | "blur" | "focusin" | "focusout" => Some(Self::Focus),
            "input" => Some(Self::Input),
            "submit" => Some(Self::Submit),
            "mouseenter" | "mouseleave" | "mousemove" | "mouseout" | "mouseover" => {
                Some(Self::Mouse)
            }
            "change" => Some(Self::Change),
            _ => None,
        }
    }
}

/// Event types that are sent as soon as they are captured.
pub const IMMEDIATE_EVENT_TYPES: &[&str] = &[
    "click", "keydown", "keyup", "input", "change", "submit", "focus", "blur", "focusin",
    "focusout",
];

/// Pointer-motion event types, rate-limited by trailing-edge debouncing.
pub const POINTER_MOTION_EVENT_TYPES: &[&str] = &[
    "mouseenter",
    "mouseleave",
    "mousemove",
    "mouseout",
    "mouseover",
];

/// A captured client event in wire form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SerializedEvent {
    Click(ClickEvent),
    Keyboard(KeyboardEvent),
    Focus(FocusEvent),
    Input(InputEvent),
    Submit(SubmitEvent),
    Mouse(MouseEvent),
    Change(ChangeEvent),
    Generic(GenericEvent),
}

impl SerializedEvent {
    pub fn base(&self) -> &EventBase {
        match self {
            Self::Click(e) => &e.base,
            Self::Keyboard(e) => &e.base,
            Self::Focus(e) => &e.base,
            Self::Input(e) => &e.base,
            Self::Submit(e) => &e.base,
            Self::Mouse(e) => &e.base,
            Self::Change(e) => &e.base,
            Self::Generic(e) => &e.base,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.base().event_type
    }

    pub fn target(&self) -> &NodeRef {
        &self.base().target
    }

    /// `None` for the generic fallback.
    pub fn category(&self) -> Option<EventCategory> {
        match self {
            Self::Click(_) => Some(EventCategory::Click),
            Self::Keyboard(_) => Some(EventCategory::Keyboard),
            Self::Focus(_) => Some(EventCategory::Focus),
            Self::Input(_) => Some(EventCategory::Input),
            Self::Submit(_) => Some(EventCategory::Submit),
            Self::Mouse(_) => Some(EventCategory::Mouse),
            Self::Change(_) => Some(EventCategory::Change),
            Self::Generic(_) => None,
        }
    }

    pub fn is_pointer_motion(&self) -> bool {
        matches!(self, Self::Mouse(_))
    }
}

impl<'de> Deserialize<'de> for SerializedEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let event_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        let event = match EventCategory::from_type(&event_type) {
            Some(EventCategory::Click) => serde_json::from_value(value).map(Self::Click),
            Some(EventCategory::Keyboard) => serde_json::from_value(value).map(Self::Keyboard),
            Some(EventCategory::Focus) => serde_json::from_value(value).map(Self::Focus),
            Some(EventCategory::Input) => serde_json::from_value(value).map(Self::Input),
            Some(EventCategory::Submit) => serde_json::from_value(value).map(Self::Submit),
            Some(EventCategory::Mouse) => serde_json::from_value(value).map(Self::Mouse),
            Some(EventCategory::Change) => serde_json::from_value(value).map(Self::Change),
            None => {
                warn!("Unhandled event type: {}", event_type);
                serde_json::from_value(value).map(Self::Generic)
            }
        };
        event.map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
