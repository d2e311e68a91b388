//! HTML parsing and serialization.
//!
//! The tree builder covers the parts of the HTML insertion modes that matter
//! for app markup: implicit `<html>`/`<head>`/`<body>`, void elements, raw
//! text elements, and implied end tags for `p`, `li`, `dd`/`dt`, `option`
//! and table rows/cells. Foster parenting and the adoption agency algorithm
//! are not implemented; misnested end tags without an open match are ignored.

mod entities;
mod serialize;
mod tokenizer;

pub(crate) use serialize::{serialize_children, serialize_node};

use tokenizer::{is_escapable_raw_text, is_raw_text, tokenize, Token};
use tracing::trace;

use crate::document::Document;
use crate::node::NodeId;

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_head_element(name: &str) -> bool {
    matches!(
        name,
        "base" | "link" | "meta" | "noscript" | "script" | "style" | "template" | "title"
    )
}

fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    InHead,
    AfterHead,
    InBody,
}

#[derive(Debug, Clone, Copy)]
struct DocumentSlots {
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    /// Open elements; index 0 is never popped.
    stack: Vec<NodeId>,
    mode: Mode,
    slots: Option<DocumentSlots>,
}

impl<'a> TreeBuilder<'a> {
    fn for_fragment(doc: &'a mut Document, fragment: NodeId) -> Self {
        Self {
            doc,
            stack: vec![fragment],
            mode: Mode::InBody,
            slots: None,
        }
    }

    fn for_document(doc: &'a mut Document, slots: DocumentSlots) -> Self {
        Self {
            doc,
            stack: vec![slots.head],
            mode: Mode::InHead,
            slots: Some(slots),
        }
    }

    fn current(&self) -> NodeId {
        // The stack is seeded with one node and index 0 is never popped.
        self.stack[self.stack.len() - 1]
    }

    fn enter_body(&mut self) {
        if let Some(slots) = self.slots {
            self.mode = Mode::InBody;
            self.stack = vec![slots.body];
        }
    }

    fn insert(&mut self, node: NodeId) {
        let parent = self.current();
        self.doc.link(parent, node, None);
    }

    fn insert_text(&mut self, text: &str) {
        let parent = self.current();
        if let Some(last) = self.doc.last_child(parent) {
            if let Some(existing) = self.doc.character_data(last).filter(|_| self.doc.is_text(last)) {
                let merged = format!("{}{}", existing, text);
                self.doc.set_character_data(last, &merged);
                return;
            }
        }
        let node = self.doc.create_text_node(text);
        self.doc.link(parent, node, None);
    }

    fn merge_attributes(&mut self, target: NodeId, attrs: Vec<(String, String)>) {
        for (name, value) in attrs {
            if !self.doc.has_attribute(target, &name) {
                let _ = self.doc.set_attribute(target, &name, &value);
            }
        }
    }

    fn in_foreign_content(&self) -> bool {
        self.stack
            .iter()
            .any(|&n| matches!(self.doc.tag_name(n), Some("svg" | "math")))
    }

    /// Pop up to and including the nearest open element named in `names`,
    /// unless a `boundaries` element is found first.
    fn close_open(&mut self, names: &[&str], boundaries: &[&str]) {
        for index in (1..self.stack.len()).rev() {
            let Some(tag) = self.doc.tag_name(self.stack[index]) else {
                continue;
            };
            if names.contains(&tag) {
                self.stack.truncate(index);
                return;
            }
            if boundaries.contains(&tag) {
                return;
            }
        }
    }

    fn close_implied(&mut self, name: &str) {
        if closes_paragraph(name) {
            self.close_open(&["p"], &["button", "table", "td", "th", "template"]);
        }
        match name {
            "li" => self.close_open(&["li"], &["ul", "ol", "table"]),
            "dd" | "dt" => self.close_open(&["dd", "dt"], &["dl", "table"]),
            "option" | "optgroup" => {
                if self.doc.tag_name(self.current()) == Some("option") {
                    self.stack.pop();
                }
            }
            "tr" => self.close_open(&["tr"], &["table", "tbody", "thead", "tfoot"]),
            "td" | "th" => self.close_open(&["td", "th"], &["tr", "table"]),
            _ => {}
        }
    }

    fn process(&mut self, token: Token) {
        match token {
            Token::Doctype(name) => self.doctype(&name),
            Token::Comment(text) => {
                let node = self.doc.create_comment(&text);
                self.insert(node);
            }
            Token::Text(text) => self.text(&text),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.start_tag(name, attrs, self_closing),
            Token::EndTag(name) => self.end_tag(&name),
        }
    }

    fn doctype(&mut self, name: &str) {
        let Some(slots) = self.slots else {
            return;
        };
        let root = self.doc.root();
        let has_doctype = self
            .doc
            .children(root)
            .iter()
            .any(|&c| self.doc.node_type(c) == 10);
        if !has_doctype {
            let node = self.doc.create_doctype(name);
            let _ = self.doc.insert_before(root, node, Some(slots.html));
        }
    }

    fn text(&mut self, text: &str) {
        let whitespace_only = text.chars().all(|c| c.is_ascii_whitespace());
        match self.mode {
            Mode::InHead if Some(self.current()) == self.slots.map(|s| s.head) => {
                if whitespace_only {
                    return;
                }
                self.enter_body();
            }
            Mode::AfterHead => {
                if whitespace_only {
                    return;
                }
                self.enter_body();
            }
            _ => {}
        }
        self.insert_text(text);
    }

    fn start_tag(&mut self, name: String, attrs: Vec<(String, String)>, self_closing: bool) {
        if let Some(slots) = self.slots {
            match name.as_str() {
                "html" => {
                    self.merge_attributes(slots.html, attrs);
                    return;
                }
                "head" => return,
                "body" => {
                    self.merge_attributes(slots.body, attrs);
                    self.enter_body();
                    return;
                }
                _ => {}
            }
            match self.mode {
                Mode::InHead if is_head_element(&name) => {}
                Mode::InHead | Mode::AfterHead => self.enter_body(),
                Mode::InBody => {}
            }
        }

        if name == "br" || !self.in_foreign_content() {
            self.close_implied(&name);
        }
        let element = self.doc.create_element(&name, None);
        for (attr, value) in attrs {
            if let Err(e) = self.doc.set_attribute(element, &attr, &value) {
                trace!("Dropping attribute on <{}>: {}", name, e);
            }
        }
        self.insert(element);

        let keeps_open = !is_void_element(&name) && !(self_closing && self.in_foreign_content());
        if keeps_open {
            self.stack.push(element);
        }
    }

    fn end_tag(&mut self, name: &str) {
        if self.slots.is_some() {
            match name {
                "html" | "body" => return,
                "head" => {
                    if self.mode == Mode::InHead {
                        self.mode = Mode::AfterHead;
                        if let Some(slots) = self.slots {
                            self.stack = vec![slots.body];
                        }
                    }
                    return;
                }
                _ => {}
            }
        }
        if name == "br" {
            self.start_tag("br".to_string(), Vec::new(), false);
            return;
        }
        for index in (1..self.stack.len()).rev() {
            if self.doc.tag_name(self.stack[index]) == Some(name) {
                self.stack.truncate(index);
                return;
            }
        }
    }
}

/// Parse a complete document.
pub(crate) fn parse_document(source: &str, url: &str) -> Document {
    let mut doc = Document::bare(url);
    let root = doc.root();
    let html = doc.create_element("html", None);
    let head = doc.create_element("head", None);
    let body = doc.create_element("body", None);
    doc.link(root, html, None);
    doc.link(html, head, None);
    doc.link(html, body, None);

    let mut builder = TreeBuilder::for_document(&mut doc, DocumentSlots { html, head, body });
    for token in tokenize(source) {
        builder.process(token);
    }
    doc
}

/// Parse `markup` as the content of `context` into a new, detached fragment.
pub(crate) fn parse_fragment(doc: &mut Document, context: NodeId, markup: &str) -> NodeId {
    let fragment = doc.create_document_fragment();
    let context_name = doc.tag_name(context).map(str::to_string);
    if let Some(name) = context_name {
        if is_raw_text(&name) || is_escapable_raw_text(&name) {
            if !markup.is_empty() {
                let text = if is_raw_text(&name) {
                    markup.to_string()
                } else {
                    entities::decode_entities(markup)
                };
                let node = doc.create_text_node(&text);
                doc.link(fragment, node, None);
            }
            return fragment;
        }
    }

    let mut builder = TreeBuilder::for_fragment(doc, fragment);
    for token in tokenize(markup) {
        builder.process(token);
    }
    fragment
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod tests;
