//! Client-side event capture.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use wsdom_dom::{Document, Event, NodeId};
use wsdom_protocols::{
    ChangeEvent, ClickEvent, EventBase, EventCategory, FocusEvent, GenericEvent, InputEvent,
    KeyboardEvent, Modifiers, MouseEvent, NodeRef, SerializedEvent, SubmitEvent,
};

use super::debounce::Debouncer;
use super::now_millis;
use crate::resolver::compute_xpath;

/// Shape `event`, dispatched at `target`, into its wire form.
///
/// Events other than keyboard events are cancelled and stopped: the
/// authoritative side decides their real effect. Returns `None` when the
/// target has no structural path.
pub fn serialize_event(
    doc: &Document,
    target: NodeId,
    event: &mut Event,
) -> Option<SerializedEvent> {
    if !event.event_type.starts_with("key") {
        event.prevent_default();
        event.stop_propagation();
    }

    let Some(path) = compute_xpath(doc, target) else {
        debug!("Event target has no path: {}", event.event_type);
        return None;
    };
    let timestamp = if event.timestamp == 0 {
        now_millis()
    } else {
        event.timestamp
    };
    let base = EventBase::new(event.event_type.clone(), NodeRef::xpath(path), timestamp);

    let serialized = match EventCategory::from_type(&event.event_type) {
        Some(EventCategory::Click) => {
            let mouse = event.mouse().cloned().unwrap_or_default();
            SerializedEvent::Click(ClickEvent {
                base,
                client_x: mouse.client_x,
                client_y: mouse.client_y,
                button: mouse.button,
                buttons: mouse.buttons,
                modifiers: Modifiers {
                    alt_key: mouse.alt_key,
                    ctrl_key: mouse.ctrl_key,
                    meta_key: mouse.meta_key,
                    shift_key: mouse.shift_key,
                },
            })
        }
        Some(EventCategory::Keyboard) => {
            let key = event.keyboard().cloned().unwrap_or_default();
            let key_code = legacy_key_code(&key.key);
            let char_code = if event.event_type == "keypress" {
                single_char(&key.key).map(u32::from).unwrap_or_default()
            } else {
                0
            };
            SerializedEvent::Keyboard(KeyboardEvent {
                base,
                code: key.code,
                location: 0,
                repeat: key.repeat,
                is_composing: false,
                char_code,
                key_code,
                which: key_code,
                modifiers: Modifiers {
                    alt_key: key.alt_key,
                    ctrl_key: key.ctrl_key,
                    meta_key: key.meta_key,
                    shift_key: key.shift_key,
                },
                key: key.key,
            })
        }
        Some(EventCategory::Focus) => SerializedEvent::Focus(FocusEvent { base }),
        Some(EventCategory::Input) => {
            let input = event.input().cloned().unwrap_or_default();
            SerializedEvent::Input(InputEvent {
                base,
                value: doc.value(target),
                input_type: input.input_type,
                data: input.data,
                is_composing: input.is_composing,
            })
        }
        Some(EventCategory::Submit) => SerializedEvent::Submit(SubmitEvent { base }),
        Some(EventCategory::Mouse) => {
            let mouse = event.mouse().cloned().unwrap_or_default();
            SerializedEvent::Mouse(MouseEvent {
                base,
                client_x: mouse.client_x,
                client_y: mouse.client_y,
                page_x: mouse.client_x,
                page_y: mouse.client_y,
                screen_x: mouse.client_x,
                screen_y: mouse.client_y,
                modifiers: Modifiers {
                    alt_key: mouse.alt_key,
                    ctrl_key: mouse.ctrl_key,
                    meta_key: mouse.meta_key,
                    shift_key: mouse.shift_key,
                },
            })
        }
        Some(EventCategory::Change) => SerializedEvent::Change(ChangeEvent {
            base,
            value: doc.value(target),
        }),
        None => {
            warn!("Unhandled event type: {}", event.event_type);
            SerializedEvent::Generic(GenericEvent { base })
        }
    };
    Some(serialized)
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// `keyCode` a browser reports for `key`.
fn legacy_key_code(key: &str) -> u32 {
    match key {
        "Backspace" => 8,
        "Tab" => 9,
        "Enter" => 13,
        "Shift" => 16,
        "Control" => 17,
        "Alt" => 18,
        "Escape" => 27,
        " " => 32,
        "ArrowLeft" => 37,
        "ArrowUp" => 38,
        "ArrowRight" => 39,
        "ArrowDown" => 40,
        "Delete" => 46,
        _ => match single_char(key) {
            Some(c) if c.is_ascii_alphanumeric() => u32::from(c.to_ascii_uppercase()),
            _ => 0,
        },
    }
}

/// Routes captured events upstream.
///
/// Event types in the debounced set go through one shared [`Debouncer`];
/// every other captured type is forwarded as soon as it is serialized.
#[derive(Debug)]
pub struct EventCapture {
    captured: HashSet<String>,
    debounced: HashSet<String>,
    immediate: mpsc::UnboundedSender<SerializedEvent>,
    debouncer: Debouncer<SerializedEvent>,
}

impl EventCapture {
    /// Create a capture routing to `output`. Spawns the debouncer task, so
    /// this must run inside a tokio runtime.
    pub fn new(
        captured: impl IntoIterator<Item = impl Into<String>>,
        debounced: impl IntoIterator<Item = impl Into<String>>,
        window: Duration,
        output: mpsc::UnboundedSender<SerializedEvent>,
    ) -> Self {
        Self {
            captured: captured.into_iter().map(Into::into).collect(),
            debounced: debounced.into_iter().map(Into::into).collect(),
            debouncer: Debouncer::spawn(window, output.clone()),
            immediate: output,
        }
    }

    /// Whether events of `event_type` are listened for at all.
    pub fn handles(&self, event_type: &str) -> bool {
        self.captured.contains(event_type) || self.debounced.contains(event_type)
    }

    /// Serialize `event` and send it on its route. Returns `false` when the
    /// event was not sent.
    pub fn capture(&self, doc: &Document, target: NodeId, event: &mut Event) -> bool {
        if !self.handles(&event.event_type) {
            return false;
        }
        let Some(serialized) = serialize_event(doc, target, event) else {
            return false;
        };
        if self.debounced.contains(serialized.event_type()) {
            self.debouncer.push(serialized)
        } else {
            self.immediate.send(serialized).is_ok()
        }
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
