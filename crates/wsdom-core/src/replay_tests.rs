use wsdom_dom::{BLANK_DOCUMENT, DomCapabilities};
use wsdom_protocols::InsertPosition;

use super::*;
use crate::interceptor::{InstrumentedDom, MutationLog};

struct Mirror {
    doc: Document,
    stash: NodeStash,
}

impl Mirror {
    fn new(html: &str) -> Self {
        Self {
            doc: Document::parse(html, "about:blank"),
            stash: NodeStash::new(),
        }
    }

    fn apply(&mut self, mutations: &[Mutation]) -> usize {
        apply_all(&mut self.doc, &mut self.stash, mutations)
    }

    fn body_html(&self) -> String {
        self.doc.inner_html(self.doc.body().unwrap())
    }
}

#[test]
fn test_replay_element_and_text_scenario() {
    let mut mirror = Mirror::new(BLANK_DOCUMENT);
    let applied = mirror.apply(&[
        Mutation::CreateElement {
            tag_name: "button".to_string(),
            id: 0,
            is: None,
        },
        Mutation::CreateTextNode {
            data: "Test Button".to_string(),
            id: 1,
        },
        Mutation::AppendChild {
            parent: NodeRef::stashed(0),
            child: 1,
        },
        Mutation::SetAttribute {
            target: NodeRef::stashed(0),
            name: "id".to_string(),
            value: "test-button".to_string(),
        },
        Mutation::AppendChild {
            parent: NodeRef::body(),
            child: 0,
        },
    ]);
    assert_eq!(applied, 5);
    assert_eq!(
        mirror.body_html(),
        r#"<button id="test-button">Test Button</button>"#
    );
    assert!(mirror.stash.is_empty());
}

#[test]
fn test_replay_reproduces_instrumented_tree() {
    let log = MutationLog::new();
    let mut source = InstrumentedDom::new(
        Document::parse(BLANK_DOCUMENT, "about:blank"),
        log.clone(),
    );
    let body = source.document().body().unwrap();

    let list = source.create_element("ul", None);
    source.set_attribute(list, "class", "items").unwrap();
    for label in ["one", "two", "three"] {
        let item = source.create_element("li", None);
        let text = source.create_text_node(label);
        source.append_child(item, text).unwrap();
        source.append_child(list, item).unwrap();
    }
    source.append_child(body, list).unwrap();
    let first = source.document().first_child(list).unwrap();
    source.remove(first);
    let heading = source.create_element("h1", None);
    source
        .insert_adjacent_element(list, InsertPosition::BeforeBegin, heading)
        .unwrap();
    source
        .set_property(heading, "textContent", "Title".into())
        .unwrap();
    source
        .insert_adjacent_html(list, InsertPosition::AfterEnd, "<p>tail</p>")
        .unwrap();
    let copy = source.clone_node(list, true);
    source.append_child(body, copy).unwrap();
    source
        .prepend(
            body,
            vec![NodeOrText::Text("a".to_string()), NodeOrText::Text("b".to_string())],
        )
        .unwrap();

    let mut mirror = Mirror::new(BLANK_DOCUMENT);
    let mutations = log.take();
    assert_eq!(mirror.apply(&mutations), mutations.len());
    assert_eq!(mirror.body_html(), source.document().inner_html(body));
}

#[test]
fn test_replay_initial_snapshot() {
    let mut mirror = Mirror::new("<body><div>stale</div></body>");
    mirror.apply(&[Mutation::body_snapshot("<p>Hi</p>")]);
    assert_eq!(mirror.body_html(), "<p>Hi</p>");
}

#[test]
fn test_unresolved_reference_is_skipped() {
    let mut mirror = Mirror::new(BLANK_DOCUMENT);
    let skipped = [
        Mutation::SetAttribute {
            target: NodeRef::xpath("/html/body/div[3]"),
            name: "class".to_string(),
            value: "x".to_string(),
        },
        Mutation::AppendChild {
            parent: NodeRef::body(),
            child: 9,
        },
        Mutation::RemoveElement {
            target: NodeRef::stashed(4),
        },
    ];
    for mutation in &skipped {
        assert!(!apply_mutation(&mut mirror.doc, &mut mirror.stash, mutation));
    }
    assert_eq!(mirror.body_html(), "");
}

#[test]
fn test_invalid_operation_is_skipped() {
    let mut mirror = Mirror::new("<body><div><span></span></div></body>");
    let applied = apply_mutation(
        &mut mirror.doc,
        &mut mirror.stash,
        &Mutation::RemoveChild {
            parent: NodeRef::xpath("/html/body/div[1]/span[1]"),
            child: NodeRef::xpath("/html/body/div[1]"),
        },
    );
    assert!(!applied);
    assert_eq!(mirror.body_html(), "<div><span></span></div>");
}

#[test]
fn test_set_property_recoerces_booleans() {
    let mut mirror = Mirror::new("<body><input disabled></body>");
    let input = NodeRef::xpath("/html/body/input[1]");
    mirror.apply(&[
        Mutation::SetProperty {
            target: input.clone(),
            name: "disabled".to_string(),
            value: "false".to_string(),
        },
        Mutation::SetProperty {
            target: input.clone(),
            name: "checked".to_string(),
            value: "true".to_string(),
        },
    ]);
    let node = mirror.stash.get(&mirror.doc, &input).unwrap();
    assert_eq!(mirror.doc.get_property(node, "disabled"), PropertyValue::Bool(false));
    assert!(mirror.doc.checked(node));
    assert_eq!(mirror.body_html(), "<input>");
}

#[test]
fn test_prepend_records_keep_argument_order() {
    let mut mirror = Mirror::new("<body><p>c</p></body>");
    mirror.apply(&[
        Mutation::CreateElement {
            tag_name: "i".to_string(),
            id: 0,
            is: None,
        },
        Mutation::PrependChild {
            parent: NodeRef::body(),
            child: PrependItem::Text("b".to_string()),
        },
        Mutation::PrependChild {
            parent: NodeRef::body(),
            child: PrependItem::Stashed(0),
        },
    ]);
    assert_eq!(mirror.body_html(), "<i></i>b<p>c</p>");
    assert!(mirror.stash.is_empty());
}

#[test]
fn test_clone_is_stashed_under_clone_id() {
    let mut mirror = Mirror::new("<body><p class=\"x\">t</p></body>");
    mirror.apply(&[
        Mutation::CloneNode {
            target: NodeRef::xpath("/html/body/p[1]"),
            clone_id: 7,
            deep: false,
        },
        Mutation::AppendChild {
            parent: NodeRef::body(),
            child: 7,
        },
    ]);
    assert_eq!(mirror.body_html(), r#"<p class="x">t</p><p class="x"></p>"#);
}

#[test]
fn test_normalize_and_text_insertions() {
    let mut mirror = Mirror::new("<body><p>a</p></body>");
    let p = NodeRef::xpath("/html/body/p[1]");
    mirror.apply(&[
        Mutation::InsertAdjacentText {
            target: p.clone(),
            position: InsertPosition::BeforeEnd,
            text: "b".to_string(),
        },
        Mutation::Normalize { target: p.clone() },
    ]);
    let node = mirror.stash.get(&mirror.doc, &p).unwrap();
    assert_eq!(mirror.doc.children(node).len(), 1);
    assert_eq!(mirror.doc.text_content(node), "ab");
}
