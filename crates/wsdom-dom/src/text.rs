//! `innerText` approximation.
//!
//! Only inline `display: none`, the `hidden` attribute and elements that are
//! never rendered are treated as invisible; no stylesheet is consulted.

use crate::document::Document;
use crate::node::{NodeData, NodeId};

fn is_never_rendered(name: &str) -> bool {
    matches!(
        name,
        "head" | "script" | "style" | "template" | "noscript" | "title" | "meta" | "link"
    )
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "dd"
            | "details"
            | "dialog"
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
            | "html"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "tr"
            | "ul"
    )
}

enum Item {
    Text { text: String, preformatted: bool },
    /// Required line breaks between blocks.
    Break(usize),
    /// A literal newline from `<br>`.
    Newline,
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

impl Document {
    fn is_hidden(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if is_never_rendered(&el.name) || el.attr("hidden").is_some() {
            return true;
        }
        el.attr("style").is_some_and(|style| {
            style.split(';').any(|decl| {
                let mut parts = decl.splitn(2, ':');
                let prop = parts.next().unwrap_or_default().trim();
                let value = parts.next().unwrap_or_default().trim();
                prop.eq_ignore_ascii_case("display") && value.eq_ignore_ascii_case("none")
            })
        })
    }

    /// Rendered text of `id`. Elements that are not rendered fall back to
    /// `textContent`.
    pub fn inner_text(&self, id: NodeId) -> String {
        if !self.is_element(id) || self.is_hidden(id) {
            return self.text_content(id);
        }
        let preformatted = matches!(self.tag_name(id), Some("pre" | "textarea"));
        let mut items = Vec::new();
        self.collect_text(id, preformatted, &mut items);

        let mut out = String::new();
        let mut pending = 0;
        for item in items {
            match item {
                Item::Break(n) => pending = pending.max(n),
                Item::Newline => {
                    let kept = out.trim_end_matches(' ').len();
                    out.truncate(kept);
                    if pending > 0 && !out.is_empty() {
                        out.push_str(&"\n".repeat(pending));
                    }
                    pending = 0;
                    out.push('\n');
                }
                Item::Text { text, preformatted } => {
                    let text = if preformatted {
                        text
                    } else {
                        collapse_whitespace(&text)
                    };
                    if text.is_empty() {
                        continue;
                    }
                    if pending > 0 && !out.is_empty() {
                        let kept = out.trim_end_matches(' ').len();
                        out.truncate(kept);
                        out.push_str(&"\n".repeat(pending));
                    }
                    pending = 0;
                    let at_line_start = out.is_empty() || out.ends_with(' ') || out.ends_with('\n');
                    if !preformatted && at_line_start {
                        out.push_str(text.trim_start_matches(' '));
                    } else {
                        out.push_str(&text);
                    }
                }
            }
        }
        let kept = out.trim_end_matches(' ').len();
        out.truncate(kept);
        out
    }

    fn collect_text(&self, id: NodeId, preformatted: bool, items: &mut Vec<Item>) {
        for &child in self.children(id) {
            match self.data(child) {
                Some(NodeData::Text(text)) => items.push(Item::Text {
                    text: text.clone(),
                    preformatted,
                }),
                Some(NodeData::Element(el)) => {
                    if self.is_hidden(child) {
                        continue;
                    }
                    let name = el.name.as_str();
                    if name == "br" {
                        items.push(Item::Newline);
                        continue;
                    }
                    let breaks = match name {
                        "p" => 2,
                        n if is_block(n) => 1,
                        _ => 0,
                    };
                    if breaks > 0 {
                        items.push(Item::Break(breaks));
                    }
                    let pre = preformatted || matches!(name, "pre" | "textarea");
                    self.collect_text(child, pre, items);
                    if breaks > 0 {
                        items.push(Item::Break(breaks));
                    }
                    let is_cell = matches!(name, "td" | "th");
                    let has_next_cell = self
                        .next_sibling(child)
                        .and_then(|n| self.tag_name(n))
                        .is_some_and(|n| matches!(n, "td" | "th"));
                    if is_cell && has_next_cell {
                        items.push(Item::Text {
                            text: "\t".to_string(),
                            preformatted: true,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    /// Replace the children of `id` with text, turning newlines into `<br>`.
    pub fn set_inner_text(&mut self, id: NodeId, text: &str) {
        if !self.is_element(id) {
            self.set_text_content(id, text);
            return;
        }
        self.clear_children(id);
        let normalized = text.replace("\r\n", "\n");
        for (i, line) in normalized.split('\n').enumerate() {
            if i > 0 {
                let br = self.create_element("br", None);
                self.link(id, br, None);
            }
            if !line.is_empty() {
                let node = self.create_text_node(line);
                self.link(id, node, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner_text_of(markup: &str) -> String {
        let mut doc = Document::default();
        let body = doc.body().unwrap();
        doc.set_inner_html(body, markup).unwrap();
        doc.inner_text(body)
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(inner_text_of("  hello \n   world  "), "hello world");
    }

    #[test]
    fn test_blocks_break_lines() {
        assert_eq!(inner_text_of("<div>one</div><div>two</div>"), "one\ntwo");
        assert_eq!(inner_text_of("<p>one</p><p>two</p>"), "one\n\ntwo");
        assert_eq!(inner_text_of("a<br>b"), "a\nb");
    }

    #[test]
    fn test_hidden_content_skipped() {
        assert_eq!(
            inner_text_of(r#"shown<span style="display: none">gone</span><span hidden>x</span><script>code()</script>"#),
            "shown"
        );
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        assert_eq!(inner_text_of("<pre>a  b\n c</pre>"), "a  b\n c");
    }

    #[test]
    fn test_hidden_element_falls_back_to_text_content() {
        let mut doc = Document::default();
        let body = doc.body().unwrap();
        doc.set_inner_html(body, r#"<div style="display:none">  raw  </div>"#)
            .unwrap();
        let div = doc.first_child(body).unwrap();
        assert_eq!(doc.inner_text(div), "  raw  ");
    }

    #[test]
    fn test_set_inner_text_inserts_breaks() {
        let mut doc = Document::default();
        let body = doc.body().unwrap();
        doc.set_inner_text(body, "one\ntwo");
        assert_eq!(doc.inner_html(body), "one<br>two");
    }
}
