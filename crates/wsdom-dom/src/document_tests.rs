use super::*;

fn with_body(markup: &str) -> (Document, NodeId) {
    let mut doc = Document::default();
    let body = doc.body().unwrap();
    doc.set_inner_html(body, markup).unwrap();
    (doc, body)
}

#[test]
fn test_default_document_skeleton() {
    let doc = Document::default();
    assert_eq!(doc.url(), "about:blank");
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tag_name(html), Some("html"));
    assert!(doc.head().is_some());
    assert!(doc.body().is_some());
    assert_eq!(doc.node_type(doc.root()), 9);
}

#[test]
fn test_append_connects_node() {
    let mut doc = Document::default();
    let body = doc.body().unwrap();
    let button = doc.create_element("BUTTON", None);
    assert!(!doc.is_connected(button));
    assert_eq!(doc.tag_name(button), Some("button"));

    let text = doc.create_text_node("Test Button");
    doc.append_child(button, text).unwrap();
    doc.append_child(body, button).unwrap();

    assert!(doc.is_connected(text));
    assert_eq!(doc.inner_html(body), "<button>Test Button</button>");
    assert_eq!(doc.node_name(button), "BUTTON");
    assert_eq!(doc.node_name(text), "#text");
}

#[test]
fn test_append_moves_existing_child() {
    let (mut doc, body) = with_body("<div id=\"a\"></div><div id=\"b\"></div>");
    let a = doc.get_element_by_id("a").unwrap();
    let b = doc.get_element_by_id("b").unwrap();
    doc.append_child(b, a).unwrap();
    assert_eq!(doc.children(body), &[b]);
    assert_eq!(doc.parent(a), Some(b));
}

#[test]
fn test_fragment_insert_empties_fragment() {
    let mut doc = Document::default();
    let body = doc.body().unwrap();
    let fragment = doc.create_document_fragment();
    let one = doc.create_element("i", None);
    let two = doc.create_element("b", None);
    doc.append_child(fragment, one).unwrap();
    doc.append_child(fragment, two).unwrap();

    doc.append_child(body, fragment).unwrap();
    assert!(doc.children(fragment).is_empty());
    assert_eq!(doc.inner_html(body), "<i></i><b></b>");
}

#[test]
fn test_insert_before_reference() {
    let (mut doc, body) = with_body("<p id=\"last\"></p>");
    let last = doc.get_element_by_id("last").unwrap();
    let first = doc.create_element("h1", None);
    doc.insert_before(body, first, Some(last)).unwrap();
    assert_eq!(doc.inner_html(body), "<h1></h1><p id=\"last\"></p>");
}

#[test]
fn test_hierarchy_errors() {
    let (mut doc, body) = with_body("<div><span></span></div>");
    let div = doc.first_child(body).unwrap();
    let span = doc.first_child(div).unwrap();

    let err = doc.append_child(span, div).unwrap_err();
    assert!(matches!(err, DomError::HierarchyRequest(_)));

    let text = doc.create_text_node("x");
    let other = doc.create_element("b", None);
    let err = doc.append_child(text, other).unwrap_err();
    assert!(matches!(err, DomError::HierarchyRequest(_)));
}

#[test]
fn test_remove_child_requires_parent() {
    let (mut doc, body) = with_body("<div></div>");
    let stray = doc.create_element("span", None);
    let err = doc.remove_child(body, stray).unwrap_err();
    assert_eq!(
        err,
        DomError::NotAChild {
            parent: body,
            child: stray
        }
    );

    let div = doc.first_child(body).unwrap();
    doc.remove_child(body, div).unwrap();
    assert!(doc.children(body).is_empty());
    assert!(doc.contains(div));
}

#[test]
fn test_remove_detached_is_noop() {
    let mut doc = Document::default();
    let orphan = doc.create_element("div", None);
    doc.remove(orphan);
    assert_eq!(doc.parent(orphan), None);
}

#[test]
fn test_insert_adjacent_positions() {
    let (mut doc, body) = with_body("<div id=\"t\">mid</div>");
    let target = doc.get_element_by_id("t").unwrap();

    doc.insert_adjacent_text(target, InsertPosition::BeforeBegin, "1").unwrap();
    doc.insert_adjacent_text(target, InsertPosition::AfterBegin, "2").unwrap();
    doc.insert_adjacent_text(target, InsertPosition::BeforeEnd, "3").unwrap();
    doc.insert_adjacent_text(target, InsertPosition::AfterEnd, "4").unwrap();

    assert_eq!(doc.inner_html(body), "1<div id=\"t\">2mid3</div>4");
}

#[test]
fn test_insert_adjacent_without_parent() {
    let mut doc = Document::default();
    let orphan = doc.create_element("div", None);
    let el = doc.create_element("span", None);
    let inserted = doc
        .insert_adjacent_element(orphan, InsertPosition::BeforeBegin, el)
        .unwrap();
    assert_eq!(inserted, None);

    let inserted = doc
        .insert_adjacent_element(orphan, InsertPosition::BeforeEnd, el)
        .unwrap();
    assert_eq!(inserted, Some(el));
    assert_eq!(doc.parent(el), Some(orphan));

    let text = doc.create_text_node("t");
    let err = doc
        .insert_adjacent_element(orphan, InsertPosition::BeforeEnd, text)
        .unwrap_err();
    assert_eq!(err, DomError::NotAnElement(text));
}

#[test]
fn test_insert_adjacent_html() {
    let (mut doc, body) = with_body("<div id=\"t\"></div>");
    let target = doc.get_element_by_id("t").unwrap();
    doc.insert_adjacent_html(target, InsertPosition::AfterEnd, "<em>a</em><em>b</em>")
        .unwrap();
    doc.insert_adjacent_html(target, InsertPosition::AfterBegin, "<i>in</i>")
        .unwrap();
    assert_eq!(
        doc.inner_html(body),
        "<div id=\"t\"><i>in</i></div><em>a</em><em>b</em>"
    );

    let orphan = doc.create_element("div", None);
    let err = doc
        .insert_adjacent_html(orphan, InsertPosition::BeforeBegin, "<b></b>")
        .unwrap_err();
    assert_eq!(err, DomError::NoParent(orphan));
}

#[test]
fn test_prepend_keeps_argument_order() {
    let (mut doc, body) = with_body("<ul><li>c</li></ul>");
    let list = doc.first_child(body).unwrap();
    let a = doc.create_element("li", None);
    doc.prepend(
        list,
        vec![NodeOrText::Node(a), NodeOrText::Text("b".to_string())],
    )
    .unwrap();
    assert_eq!(doc.inner_html(list), "<li></li>b<li>c</li>");
}

#[test]
fn test_normalize_merges_text() {
    let mut doc = Document::default();
    let body = doc.body().unwrap();
    let div = doc.create_element("div", None);
    doc.append_child(body, div).unwrap();
    for piece in ["a", "", "b"] {
        let t = doc.create_text_node(piece);
        doc.append_child(div, t).unwrap();
    }
    let span = doc.create_element("span", None);
    doc.append_child(div, span).unwrap();
    let empty = doc.create_text_node("");
    doc.append_child(span, empty).unwrap();

    doc.normalize(body);
    assert_eq!(doc.children(div).len(), 2);
    assert_eq!(doc.text_content(div), "ab");
    assert!(doc.children(span).is_empty());
}

#[test]
fn test_clone_node_shallow_and_deep() {
    let (mut doc, body) = with_body("<p class=\"x\">text</p>");
    let p = doc.first_child(body).unwrap();

    let shallow = doc.clone_node(p, false);
    assert_eq!(doc.outer_html(shallow), "<p class=\"x\"></p>");
    assert_eq!(doc.parent(shallow), None);

    let deep = doc.clone_node(p, true);
    assert_eq!(doc.outer_html(deep), "<p class=\"x\">text</p>");
    assert_ne!(doc.first_child(deep), doc.first_child(p));
}

#[test]
fn test_attributes() {
    let mut doc = Document::default();
    let el = doc.create_element("div", None);
    doc.set_attribute(el, "Data-Key", "1").unwrap();
    assert_eq!(doc.get_attribute(el, "data-key"), Some("1"));
    doc.set_attribute(el, "data-key", "2").unwrap();
    assert_eq!(doc.attributes(el).len(), 1);
    assert_eq!(doc.get_attribute(el, "DATA-KEY"), Some("2"));

    let err = doc.set_attribute(el, "bad name", "x").unwrap_err();
    assert!(matches!(err, DomError::InvalidCharacter(_)));

    assert!(doc.remove_attribute(el, "data-key"));
    assert!(!doc.remove_attribute(el, "data-key"));

    let text = doc.create_text_node("t");
    assert_eq!(
        doc.set_attribute(text, "id", "x").unwrap_err(),
        DomError::NotAnElement(text)
    );
}

#[test]
fn test_duplicate_ids_resolve_to_first() {
    let (doc, body) = with_body("<i id=\"dup\"></i><b id=\"dup\"></b>");
    let first = doc.first_child(body).unwrap();
    assert_eq!(doc.get_element_by_id("dup"), Some(first));
    assert_eq!(doc.get_element_by_id(""), None);
}

#[test]
fn test_detached_elements_not_found_by_id() {
    let mut doc = Document::default();
    let el = doc.create_element("div", None);
    doc.set_attribute(el, "id", "floating").unwrap();
    assert_eq!(doc.get_element_by_id("floating"), None);
}

#[test]
fn test_set_outer_html() {
    let (mut doc, body) = with_body("<a></a><div id=\"old\"></div><b></b>");
    let old = doc.get_element_by_id("old").unwrap();
    doc.set_outer_html(old, "<span>new</span>").unwrap();
    assert_eq!(doc.inner_html(body), "<a></a><span>new</span><b></b>");
    assert_eq!(doc.parent(old), None);
}

#[test]
fn test_text_content() {
    let (mut doc, body) = with_body("<p>a<b>b</b><!--c--></p>");
    let p = doc.first_child(body).unwrap();
    assert_eq!(doc.text_content(p), "ab");
    doc.set_text_content(p, "plain <text>");
    assert_eq!(doc.inner_html(p), "plain &lt;text&gt;");
    doc.set_text_content(p, "");
    assert!(doc.children(p).is_empty());
}

#[test]
fn test_sibling_navigation() {
    let (doc, body) = with_body("<a></a><b></b><i></i>");
    let b = doc.children(body)[1];
    assert_eq!(doc.tag_name(doc.previous_sibling(b).unwrap()), Some("a"));
    assert_eq!(doc.tag_name(doc.next_sibling(b).unwrap()), Some("i"));
    assert_eq!(doc.index_in_parent(b), Some(1));
    assert_eq!(doc.closest(b, "body"), Some(body));
}

#[test]
fn test_inner_html_writes_reuse_slots() {
    let (mut doc, body) = with_body("");
    let baseline = doc.arena_len();
    let live = doc.live_nodes();
    for i in 0..10_000 {
        doc.set_inner_html(body, &format!("<p>tick {}</p>", i)).unwrap();
    }
    assert_eq!(doc.inner_html(body), "<p>tick 9999</p>");
    assert!(doc.arena_len() <= baseline + 4, "arena grew to {}", doc.arena_len());
    assert_eq!(doc.live_nodes(), live + 2);
}

#[test]
fn test_released_handles_go_stale() {
    let (mut doc, body) = with_body("<p id=\"old\">x</p>");
    let old = doc.get_element_by_id("old").unwrap();
    doc.set_text_content(body, "replaced");
    assert!(!doc.contains(old));
    assert_eq!(doc.tag_name(old), None);
    assert_eq!(doc.parent(old), None);

    // The freed slot is reused under a new generation.
    let fresh = doc.create_element("div", None);
    assert_ne!(fresh, old);
    assert!(doc.contains(fresh));
    assert!(!doc.contains(old));
    assert!(doc.append_child(body, old).is_err());
}

#[test]
fn test_removed_nodes_stay_usable() {
    let (mut doc, body) = with_body("<p id=\"keep\">x</p>");
    let p = doc.get_element_by_id("keep").unwrap();
    doc.remove(p);
    doc.set_inner_html(body, "<i></i>").unwrap();
    assert!(doc.contains(p));
    doc.append_child(body, p).unwrap();
    assert_eq!(doc.inner_html(body), "<i></i><p id=\"keep\">x</p>");
}

#[test]
fn test_release_ignores_attached_nodes() {
    let (mut doc, body) = with_body("<p>x</p>");
    let live = doc.live_nodes();
    doc.release(body);
    doc.release(doc.root());
    assert_eq!(doc.live_nodes(), live);
    assert_eq!(doc.inner_html(body), "<p>x</p>");
}
