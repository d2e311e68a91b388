//! Form control state: `value`, `checked`/`selected`, text selection.

use tracing::debug;

use crate::document::Document;
use crate::node::NodeId;

/// `type` values whose value is edited as free text.
fn is_text_input_type(kind: &str) -> bool {
    matches!(
        kind,
        "text" | "search" | "url" | "tel" | "email" | "password"
    )
}

const KNOWN_INPUT_TYPES: &[&str] = &[
    "button", "checkbox", "color", "date", "datetime-local", "email", "file", "hidden", "image",
    "month", "number", "password", "radio", "range", "reset", "search", "submit", "tel", "text",
    "time", "url", "week",
];

fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

impl Document {
    /// Lowercase `type` of an `<input>`; unknown or missing types are `text`.
    pub fn input_type(&self, id: NodeId) -> String {
        self.get_attribute(id, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| KNOWN_INPUT_TYPES.contains(&t.as_str()))
            .unwrap_or_else(|| "text".to_string())
    }

    /// Whether `id` is a `<textarea>` or a text-like `<input>`.
    pub fn is_text_control(&self, id: NodeId) -> bool {
        match self.tag_name(id) {
            Some("textarea") => true,
            Some("input") => is_text_input_type(&self.input_type(id)),
            _ => false,
        }
    }

    pub fn is_checkable(&self, id: NodeId) -> bool {
        self.tag_name(id) == Some("input")
            && matches!(self.input_type(id).as_str(), "checkbox" | "radio")
    }

    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        match el.name.as_str() {
            "input" => el
                .form
                .dirty_value
                .clone()
                .or_else(|| el.attr("value").map(str::to_string))
                .unwrap_or_else(|| {
                    if self.is_checkable(id) {
                        "on".to_string()
                    } else {
                        String::new()
                    }
                }),
            "textarea" => el
                .form
                .dirty_value
                .clone()
                .unwrap_or_else(|| self.text_content(id)),
            "select" => self
                .options(id)
                .into_iter()
                .find(|&o| self.selected(o))
                .map(|o| self.value(o))
                .unwrap_or_default(),
            "option" => el.attr("value").map(str::to_string).unwrap_or_else(|| {
                self.text_content(id)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            _ => el.attr("value").unwrap_or_default().to_string(),
        }
    }

    /// Set the current value. For text controls the selection collapses to
    /// the end of the new value.
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        match self.tag_name(id) {
            Some("select") => {
                let target = self
                    .options(id)
                    .into_iter()
                    .find(|&o| self.value(o) == value);
                for option in self.options(id) {
                    if let Some(el) = self.element_mut(option) {
                        el.form.checked = Some(Some(option) == target);
                    }
                }
            }
            Some("input") if self.is_checkable(id) => {
                if let Err(e) = self.set_attribute(id, "value", value) {
                    debug!("Could not set value of {}: {}", id, e);
                }
            }
            Some("input") | Some("textarea") => {
                let value = if self.tag_name(id) == Some("input") {
                    value.replace(['\r', '\n'], "")
                } else {
                    normalize_newlines(value)
                };
                let len = value.chars().count();
                if let Some(el) = self.element_mut(id) {
                    el.form.dirty_value = Some(value);
                    el.form.selection = Some((len, len));
                }
            }
            Some(_) => {
                if let Err(e) = self.set_attribute(id, "value", value) {
                    debug!("Could not set value of {}: {}", id, e);
                }
            }
            None => {}
        }
    }

    /// Selection as character offsets; collapsed at the end when unset.
    pub fn selection(&self, id: NodeId) -> (usize, usize) {
        let len = self.value(id).chars().count();
        match self.element(id).and_then(|el| el.form.selection) {
            Some((start, end)) => (start.min(len), end.min(len)),
            None => (len, len),
        }
    }

    pub fn set_selection_range(&mut self, id: NodeId, start: usize, end: usize) {
        let len = self.value(id).chars().count();
        let end = end.min(len);
        let start = start.min(end);
        if let Some(el) = self.element_mut(id) {
            el.form.selection = Some((start, end));
        }
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id)
            .map(|el| el.form.checked.unwrap_or_else(|| el.attr("checked").is_some()))
            .unwrap_or(false)
    }

    /// Set checkedness. Checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.form.checked = Some(checked);
        }
        if !checked || self.input_type(id) != "radio" {
            return;
        }
        let Some(name) = self
            .get_attribute(id, "name")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
        else {
            return;
        };
        let scope = self.closest(id, "form").unwrap_or_else(|| self.tree_root(id));
        let group: Vec<NodeId> = self
            .descendants(scope)
            .into_iter()
            .filter(|&n| {
                n != id
                    && self.tag_name(n) == Some("input")
                    && self.input_type(n) == "radio"
                    && self.get_attribute(n, "name") == Some(name.as_str())
            })
            .collect();
        for other in group {
            if let Some(el) = self.element_mut(other) {
                el.form.checked = Some(false);
            }
        }
    }

    pub fn selected(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if let Some(selected) = el.form.checked {
            return selected;
        }
        if el.attr("selected").is_some() {
            return true;
        }
        // A single-select with nothing explicitly selected shows its first option.
        let Some(select) = self.closest(id, "select") else {
            return false;
        };
        if self.has_attribute(select, "multiple") {
            return false;
        }
        let options = self.options(select);
        let any_selected = options.iter().any(|&o| {
            self.element(o).is_some_and(|el| match el.form.checked {
                Some(selected) => selected,
                None => el.attr("selected").is_some(),
            })
        });
        !any_selected && options.first() == Some(&id)
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) {
        let single = self
            .closest(id, "select")
            .filter(|&s| !self.has_attribute(s, "multiple"));
        if let (true, Some(select)) = (selected, single) {
            for option in self.options(select) {
                if let Some(el) = self.element_mut(option) {
                    el.form.checked = Some(option == id);
                }
            }
            return;
        }
        if let Some(el) = self.element_mut(id) {
            el.form.checked = Some(selected);
        }
    }

    /// `<option>` descendants of a `<select>`.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|&n| self.tag_name(n) == Some("option"))
            .collect()
    }

    /// Topmost ancestor of `id` (the document node when connected).
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(markup: &str) -> Document {
        let mut doc = Document::default();
        let body = doc.body().unwrap();
        doc.set_inner_html(body, markup).unwrap();
        doc
    }

    #[test]
    fn test_input_value_defaults_to_attribute() {
        let mut doc = body_with(r#"<input id="a" value="seed">"#);
        let input = doc.get_element_by_id("a").unwrap();
        assert_eq!(doc.value(input), "seed");
        doc.set_value(input, "typed");
        assert_eq!(doc.value(input), "typed");
        assert_eq!(doc.get_attribute(input, "value"), Some("seed"));
        assert_eq!(doc.selection(input), (5, 5));
    }

    #[test]
    fn test_text_control_detection() {
        let doc = body_with(
            r#"<input id="t"><input id="e" type="EMAIL"><input id="c" type="checkbox"><textarea id="x"></textarea><input id="w" type="weird">"#,
        );
        let id = |name: &str| doc.get_element_by_id(name).unwrap();
        assert!(doc.is_text_control(id("t")));
        assert!(doc.is_text_control(id("e")));
        assert!(!doc.is_text_control(id("c")));
        assert!(doc.is_text_control(id("x")));
        assert!(doc.is_text_control(id("w")));
    }

    #[test]
    fn test_textarea_value_from_content() {
        let doc = body_with("<textarea id=\"x\">line one</textarea>");
        let area = doc.get_element_by_id("x").unwrap();
        assert_eq!(doc.value(area), "line one");
    }

    #[test]
    fn test_selection_clamped() {
        let mut doc = body_with(r#"<input id="a" value="abc">"#);
        let input = doc.get_element_by_id("a").unwrap();
        doc.set_selection_range(input, 2, 10);
        assert_eq!(doc.selection(input), (2, 3));
        doc.set_selection_range(input, 5, 1);
        assert_eq!(doc.selection(input), (1, 1));
    }

    #[test]
    fn test_radio_group_exclusive() {
        let mut doc = body_with(
            r#"<form><input id="a" type="radio" name="g" checked><input id="b" type="radio" name="g"><input id="c" type="radio" name="other" checked></form>"#,
        );
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        let c = doc.get_element_by_id("c").unwrap();
        assert!(doc.checked(a));
        doc.set_checked(b, true);
        assert!(doc.checked(b));
        assert!(!doc.checked(a));
        assert!(doc.checked(c));
    }

    #[test]
    fn test_select_value() {
        let mut doc = body_with(
            r#"<select id="s"><option value="1">One</option><option>Two</option></select>"#,
        );
        let select = doc.get_element_by_id("s").unwrap();
        assert_eq!(doc.value(select), "1");
        doc.set_value(select, "Two");
        assert_eq!(doc.value(select), "Two");
    }
}
