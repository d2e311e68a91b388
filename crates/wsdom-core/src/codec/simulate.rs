//! Server-side event reconstruction.

use tracing::{debug, trace};
use wsdom_dom::{
    DomCapabilities, Event, EventDetail, InputDetail, KeyboardDetail, MouseDetail, NodeId,
    PropertyValue,
};
use wsdom_protocols::{Modifiers, SerializedEvent};

use crate::interceptor::InstrumentedDom;

fn mouse_detail(
    client_x: f64,
    client_y: f64,
    button: i16,
    buttons: u16,
    m: Modifiers,
) -> MouseDetail {
    MouseDetail {
        client_x,
        client_y,
        button,
        buttons,
        alt_key: m.alt_key,
        ctrl_key: m.ctrl_key,
        meta_key: m.meta_key,
        shift_key: m.shift_key,
    }
}

/// Synthetic event of the native type `event` was captured from.
pub fn reconstruct_event(event: &SerializedEvent) -> Event {
    let detail = match event {
        SerializedEvent::Click(e) => EventDetail::Mouse(mouse_detail(
            e.client_x,
            e.client_y,
            e.button,
            e.buttons,
            e.modifiers,
        )),
        SerializedEvent::Mouse(e) => {
            EventDetail::Mouse(mouse_detail(e.client_x, e.client_y, 0, 0, e.modifiers))
        }
        SerializedEvent::Keyboard(e) => EventDetail::Keyboard(KeyboardDetail {
            key: e.key.clone(),
            code: e.code.clone(),
            repeat: e.repeat,
            alt_key: e.modifiers.alt_key,
            ctrl_key: e.modifiers.ctrl_key,
            meta_key: e.modifiers.meta_key,
            shift_key: e.modifiers.shift_key,
        }),
        SerializedEvent::Input(e) => EventDetail::Input(InputDetail {
            input_type: e.input_type.clone(),
            data: e.data.clone(),
            is_composing: e.is_composing,
        }),
        SerializedEvent::Focus(_)
        | SerializedEvent::Submit(_)
        | SerializedEvent::Change(_)
        | SerializedEvent::Generic(_) => EventDetail::None,
    };
    Event::new(event.event_type())
        .with_timestamp(event.base().timestamp)
        .with_detail(detail)
}

/// Dispatch a client event against the authoritative tree.
///
/// `input` and `change` write the transmitted value to the target first.
/// After dispatch, an uncancelled `keydown` on a text control runs the text
/// edit the key stands for, and an uncancelled `click` runs activation
/// behavior. Returns the dispatched event, or `None` when the target is not
/// a path or does not resolve.
pub fn dispatch_client_event(dom: &mut InstrumentedDom, event: &SerializedEvent) -> Option<Event> {
    if event.target().is_stashed() {
        debug!(
            "Client event addressed by stash id ignored: {} {}",
            event.event_type(),
            event.target()
        );
        return None;
    }
    let Some(target) = dom.resolve(event.target()) else {
        debug!(
            "Client event target not found: {} {}",
            event.event_type(),
            event.target()
        );
        return None;
    };

    match event {
        SerializedEvent::Input(e) => set_value(dom, target, &e.value),
        SerializedEvent::Change(e) => set_value(dom, target, &e.value),
        _ => {}
    }

    let dispatched = dom.dispatch_event(target, reconstruct_event(event));
    if dispatched.default_prevented() {
        return Some(dispatched);
    }

    match event {
        SerializedEvent::Keyboard(e) if e.base.event_type == "keydown" => {
            simulate_keystroke(dom, target, &e.key, e.modifiers);
        }
        SerializedEvent::Click(_) => activate(dom, target),
        _ => {}
    }
    Some(dispatched)
}

/// `HTMLElement.click()`: dispatch a click on `target` and run its
/// activation behavior unless a listener cancels it.
pub fn click(dom: &mut InstrumentedDom, target: NodeId) -> Event {
    let dispatched = dom.dispatch_event(target, Event::new("click"));
    if !dispatched.default_prevented() {
        activate(dom, target);
    }
    dispatched
}

fn set_value(dom: &mut InstrumentedDom, target: NodeId, value: &str) {
    let _ = dom.set_property(target, "value", PropertyValue::from(value));
}

fn printable_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

fn fire_input(dom: &mut InstrumentedDom, target: NodeId, input_type: &str, data: Option<String>) {
    let event = Event::new("input").with_detail(EventDetail::Input(InputDetail {
        input_type: input_type.to_string(),
        data,
        is_composing: false,
    }));
    dom.dispatch_event(target, event);
}

/// Apply the text edit a real key press would have made.
fn simulate_keystroke(dom: &mut InstrumentedDom, target: NodeId, key: &str, modifiers: Modifiers) {
    let doc = dom.document();
    if !doc.is_text_control(target) {
        return;
    }
    if key == "Enter" {
        trace!("Simulating change for Enter");
        dom.dispatch_event(target, Event::new("change"));
        return;
    }

    let value: Vec<char> = doc.value(target).chars().collect();
    let (start, end) = doc.selection(target);

    let (edited, caret, input_type, data) = if key == "Backspace" {
        if start == end && start == 0 {
            return;
        }
        let from = if start == end { start - 1 } else { start };
        let mut edited = value[..from].to_vec();
        edited.extend_from_slice(&value[end..]);
        (edited, from, "deleteContentBackward", None)
    } else if let Some(c) = printable_char(key) {
        if modifiers.ctrl_key || modifiers.meta_key {
            return;
        }
        let mut edited = value[..start].to_vec();
        edited.push(c);
        edited.extend_from_slice(&value[end..]);
        (edited, start + 1, "insertText", Some(key.to_string()))
    } else {
        return;
    };

    if edited == value {
        return;
    }
    let edited: String = edited.into_iter().collect();
    set_value(dom, target, &edited);
    dom.set_selection_range(target, caret, caret);
    fire_input(dom, target, input_type, data);
}

/// Default action of a click.
fn activate(dom: &mut InstrumentedDom, target: NodeId) {
    let doc = dom.document();
    if doc.is_checkable(target) {
        let is_radio = doc.input_type(target) == "radio";
        let was_checked = doc.checked(target);
        if is_radio && was_checked {
            return;
        }
        let _ = dom.set_property(target, "checked", PropertyValue::Bool(!was_checked));
        fire_input(dom, target, "", None);
        dom.dispatch_event(target, Event::new("change"));
        return;
    }

    if is_submit_button(dom, target) {
        if let Some(form) = dom.document().closest(target, "form") {
            trace!("Submitting form from click");
            dom.dispatch_event(form, Event::new("submit"));
        }
    }
}

fn is_submit_button(dom: &InstrumentedDom, target: NodeId) -> bool {
    let doc = dom.document();
    match doc.tag_name(target) {
        Some("button") => doc
            .get_attribute(target, "type")
            .map(|t| !matches!(t.trim().to_ascii_lowercase().as_str(), "button" | "reset"))
            .unwrap_or(true),
        Some("input") => matches!(doc.input_type(target).as_str(), "submit" | "image"),
        _ => false,
    }
}

#[cfg(test)]
#[path = "simulate_tests.rs"]
mod tests;
