use std::cell::RefCell;
use std::rc::Rc;

use wsdom_dom::Document;
use wsdom_protocols::{
    ChangeEvent, ClickEvent, EventBase, InputEvent, KeyboardEvent, Mutation, NodeRef,
};

use super::*;
use crate::interceptor::MutationLog;

type Seen = Rc<RefCell<Vec<(String, Option<InputDetail>)>>>;

fn setup(html: &str) -> (InstrumentedDom, MutationLog) {
    let log = MutationLog::new();
    let dom = InstrumentedDom::new(Document::parse(html, "about:blank"), log.clone());
    (dom, log)
}

/// Record every `types` event reaching `node`.
fn record(dom: &mut InstrumentedDom, node: NodeId, types: &[&str]) -> Seen {
    let seen: Seen = Rc::default();
    for &kind in types {
        let seen = Rc::clone(&seen);
        dom.add_event_listener(node, kind, move |_, ctx| {
            seen.borrow_mut()
                .push((ctx.event.event_type.clone(), ctx.event.input().cloned()));
        });
    }
    seen
}

fn key_event(kind: &str, path: &str, key: &str, modifiers: Modifiers) -> SerializedEvent {
    SerializedEvent::Keyboard(KeyboardEvent {
        base: EventBase::new(kind, NodeRef::xpath(path), 1),
        key: key.to_string(),
        code: String::new(),
        location: 0,
        repeat: false,
        is_composing: false,
        char_code: 0,
        key_code: 0,
        which: 0,
        modifiers,
    })
}

fn keydown(path: &str, key: &str) -> SerializedEvent {
    key_event("keydown", path, key, Modifiers::default())
}

fn click(path: &str) -> SerializedEvent {
    SerializedEvent::Click(ClickEvent {
        base: EventBase::new("click", NodeRef::xpath(path), 1),
        client_x: 0.0,
        client_y: 0.0,
        button: 0,
        buttons: 1,
        modifiers: Modifiers::default(),
    })
}

const FIELD: &str = r#"//*[@id="field"]"#;

fn field(dom: &InstrumentedDom) -> NodeId {
    dom.document().get_element_by_id("field").unwrap()
}

#[test]
fn test_keyboard_scenario() {
    let (mut dom, log) = setup(r#"<body><input id="field"></body>"#);
    let input = field(&dom);
    let seen = record(&mut dom, input, &["keydown", "input", "change"]);

    dispatch_client_event(&mut dom, &keydown(FIELD, "a")).unwrap();
    assert_eq!(dom.document().value(input), "a");
    assert_eq!(
        *seen.borrow(),
        vec![
            ("keydown".to_string(), None),
            (
                "input".to_string(),
                Some(InputDetail {
                    input_type: "insertText".to_string(),
                    data: Some("a".to_string()),
                    is_composing: false,
                })
            ),
        ]
    );
    assert_eq!(
        log.take(),
        vec![Mutation::SetProperty {
            target: NodeRef::xpath(FIELD),
            name: "value".to_string(),
            value: "a".to_string(),
        }]
    );

    seen.borrow_mut().clear();
    dispatch_client_event(&mut dom, &keydown(FIELD, "Enter")).unwrap();
    assert_eq!(dom.document().value(input), "a");
    let kinds: Vec<String> = seen.borrow().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(kinds, vec!["keydown", "change"]);
    assert!(log.is_empty());
}

#[test]
fn test_insertion_at_selection() {
    let (mut dom, _log) = setup(r#"<body><input id="field" value="held"></body>"#);
    let input = field(&dom);
    dom.set_selection_range(input, 1, 3);

    dispatch_client_event(&mut dom, &keydown(FIELD, "o")).unwrap();
    assert_eq!(dom.document().value(input), "hod");
    assert_eq!(dom.document().selection(input), (2, 2));

    dispatch_client_event(&mut dom, &keydown(FIELD, "l")).unwrap();
    assert_eq!(dom.document().value(input), "hold");
}

#[test]
fn test_backspace() {
    let (mut dom, _log) = setup(r#"<body><textarea id="field">abc</textarea></body>"#);
    let area = field(&dom);
    let seen = record(&mut dom, area, &["input"]);

    dispatch_client_event(&mut dom, &keydown(FIELD, "Backspace")).unwrap();
    assert_eq!(dom.document().value(area), "ab");
    assert_eq!(
        seen.borrow()[0].1.as_ref().map(|d| d.input_type.as_str()),
        Some("deleteContentBackward")
    );

    dom.set_selection_range(area, 0, 0);
    dispatch_client_event(&mut dom, &keydown(FIELD, "Backspace")).unwrap();
    assert_eq!(dom.document().value(area), "ab");
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_no_edit_for_modified_or_named_keys() {
    let (mut dom, log) = setup(r#"<body><input id="field" value="x"></body>"#);
    let input = field(&dom);
    let ctrl = Modifiers {
        ctrl_key: true,
        ..Default::default()
    };

    dispatch_client_event(&mut dom, &key_event("keydown", FIELD, "c", ctrl)).unwrap();
    dispatch_client_event(&mut dom, &keydown(FIELD, "Shift")).unwrap();
    dispatch_client_event(&mut dom, &keydown(FIELD, "ArrowLeft")).unwrap();
    dispatch_client_event(&mut dom, &key_event("keyup", FIELD, "z", Modifiers::default()))
        .unwrap();
    assert_eq!(dom.document().value(input), "x");
    assert!(log.is_empty());
}

#[test]
fn test_prevented_keydown_does_not_edit() {
    let (mut dom, _log) = setup(r#"<body><input id="field"></body>"#);
    let input = field(&dom);
    dom.add_event_listener(input, "keydown", |_, ctx| ctx.event.prevent_default());

    let event = dispatch_client_event(&mut dom, &keydown(FIELD, "q")).unwrap();
    assert!(event.default_prevented());
    assert_eq!(dom.document().value(input), "");
}

#[test]
fn test_keys_on_non_text_controls_ignored() {
    let (mut dom, _log) = setup(r#"<body><input id="field" type="checkbox"></body>"#);
    let input = field(&dom);
    dispatch_client_event(&mut dom, &keydown(FIELD, "a")).unwrap();
    assert_eq!(dom.document().value(input), "on");
}

#[test]
fn test_input_value_written_before_dispatch() {
    let (mut dom, log) = setup(r#"<body><input id="field"></body>"#);
    let input = field(&dom);
    let observed = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&observed);
    dom.add_event_listener(input, "input", move |dom, ctx| {
        *sink.borrow_mut() = dom.document().value(ctx.target);
    });

    let event = SerializedEvent::Input(InputEvent {
        base: EventBase::new("input", NodeRef::xpath(FIELD), 1),
        value: "typed".to_string(),
        input_type: "insertText".to_string(),
        data: Some("d".to_string()),
        is_composing: false,
    });
    dispatch_client_event(&mut dom, &event).unwrap();
    assert_eq!(*observed.borrow(), "typed");
    assert_eq!(log.len(), 1);

    let change = SerializedEvent::Change(ChangeEvent {
        base: EventBase::new("change", NodeRef::xpath(FIELD), 2),
        value: "final".to_string(),
    });
    dispatch_client_event(&mut dom, &change).unwrap();
    assert_eq!(dom.document().value(input), "final");
}

#[test]
fn test_click_toggles_checkbox() {
    let (mut dom, log) = setup(r#"<body><input id="field" type="checkbox"></body>"#);
    let input = field(&dom);
    let seen = record(&mut dom, input, &["click", "input", "change"]);

    dispatch_client_event(&mut dom, &click(FIELD)).unwrap();
    assert!(dom.document().checked(input));
    let kinds: Vec<String> = seen.borrow().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(kinds, vec!["click", "input", "change"]);
    assert_eq!(
        log.take(),
        vec![Mutation::SetProperty {
            target: NodeRef::xpath(FIELD),
            name: "checked".to_string(),
            value: "true".to_string(),
        }]
    );

    dispatch_client_event(&mut dom, &click(FIELD)).unwrap();
    assert!(!dom.document().checked(input));
}

#[test]
fn test_click_on_checked_radio_is_inert() {
    let (mut dom, log) = setup(
        r#"<body><input id="field" type="radio" name="r" checked><input type="radio" name="r"></body>"#,
    );
    dispatch_client_event(&mut dom, &click(FIELD)).unwrap();
    assert!(dom.document().checked(field(&dom)));
    assert!(log.is_empty());

    dispatch_client_event(&mut dom, &click("/html/body/input[2]")).unwrap();
    assert!(!dom.document().checked(field(&dom)));
}

#[test]
fn test_submit_button_submits_form() {
    let (mut dom, _log) = setup(
        r#"<body><form><button id="field">Send</button><button type="button">No</button></form></body>"#,
    );
    let form = dom.document().get_elements_by_tag_name("form")[0];
    let submitted = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&submitted);
    dom.add_event_listener(form, "submit", move |_, _| *counter.borrow_mut() += 1);

    dispatch_client_event(&mut dom, &click(FIELD)).unwrap();
    assert_eq!(*submitted.borrow(), 1);

    dispatch_client_event(&mut dom, &click("/html/body/form[1]/button[2]")).unwrap();
    assert_eq!(*submitted.borrow(), 1);
}

#[test]
fn test_unresolved_target_returns_none() {
    let (mut dom, _log) = setup("<body></body>");
    assert!(dispatch_client_event(&mut dom, &click("/html/body/div[9]")).is_none());
}

#[test]
fn test_stashed_target_is_rejected() {
    let (mut dom, log) = setup("<body></body>");
    let detached = dom.create_element("button", None);
    let clicks = record(&mut dom, detached, &["click"]);
    log.take();

    let event = SerializedEvent::Click(ClickEvent {
        base: EventBase::new("click", NodeRef::stashed(0), 1),
        client_x: 0.0,
        client_y: 0.0,
        button: 0,
        buttons: 1,
        modifiers: Modifiers::default(),
    });
    assert!(dispatch_client_event(&mut dom, &event).is_none());
    assert!(clicks.borrow().is_empty());
    assert!(log.take().is_empty());
}

#[test]
fn test_reconstruct_carries_fields() {
    let event = reconstruct_event(&click("/html/body"));
    assert_eq!(event.event_type, "click");
    assert_eq!(event.timestamp, 1);
    assert!(event.bubbles);
    assert_eq!(event.mouse().map(|m| m.buttons), Some(1));

    let key = reconstruct_event(&keydown("/html/body", "x"));
    assert_eq!(key.keyboard().map(|k| k.key.as_str()), Some("x"));
}

#[test]
fn test_programmatic_click_activates() {
    let (mut dom, log) = setup(r#"<body><input type="checkbox" id="box"></body>"#);
    let input = dom.document().get_element_by_id("box").unwrap();
    let seen = record(&mut dom, input, &["click", "change"]);

    let event = super::click(&mut dom, input);
    assert!(!event.default_prevented());
    assert!(dom.document().checked(input));
    let kinds: Vec<String> = seen.borrow().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(kinds, vec!["click", "change"]);
    assert!(log.take().iter().any(|m| matches!(
        m,
        Mutation::SetProperty { name, value, .. } if name == "checked" && value == "true"
    )));
}

#[test]
fn test_programmatic_click_respects_prevent_default() {
    let (mut dom, _log) = setup(r#"<body><input type="checkbox" id="box"></body>"#);
    let input = dom.document().get_element_by_id("box").unwrap();
    dom.add_event_listener(input, "click", |_, ctx| ctx.event.prevent_default());

    assert!(super::click(&mut dom, input).default_prevented());
    assert!(!dom.document().checked(input));
}
