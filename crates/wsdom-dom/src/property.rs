//! Element properties layered over attributes and form state.
//!
//! Property names are DOM IDL names (`className`, `readOnly`, `tabIndex`).
//! Reflected properties read and write the matching content attribute;
//! anything unknown is stored as an expando on the element.

use serde_json::Value;

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeData, NodeId};

/// A script-visible property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// A callable. Never serialized.
    Function,
}

impl PropertyValue {
    /// String conversion with JavaScript `String(value)` rules.
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::Function => "function () { [native code] }".to_string(),
        }
    }

    /// Like [`to_js_string`](Self::to_js_string), but `null` becomes the
    /// empty string (`[LegacyNullToEmptyString]` setters).
    pub fn to_dom_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_js_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Function => true,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function)
    }

    fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Text(s) => parse_number(s),
            Self::Function => f64::NAN,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Function => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Rebuild a typed value for `name` from its wire string.
    pub fn coerce(name: &str, raw: &str) -> Self {
        match property_kind(name) {
            PropertyKind::Boolean => {
                Self::Bool(!matches!(raw, "" | "false" | "0" | "null" | "undefined"))
            }
            PropertyKind::Numeric => Self::Number(parse_number(raw)),
            PropertyKind::Text => Self::Text(raw.to_string()),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// `Number.prototype.toString` for the common cases.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return 0.0;
    }
    match trimmed {
        "true" => 1.0,
        "false" => 0.0,
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// How a property's wire string should be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    Boolean,
    Numeric,
}

pub fn property_kind(name: &str) -> PropertyKind {
    if boolean_attribute(name).is_some()
        || matches!(name, "checked" | "selected" | "indeterminate")
    {
        PropertyKind::Boolean
    } else if numeric_attribute(name).is_some()
        || matches!(
            name,
            "selectionStart" | "selectionEnd" | "selectedIndex" | "scrollTop" | "scrollLeft"
        )
    {
        PropertyKind::Numeric
    } else {
        PropertyKind::Text
    }
}

fn reflected_attribute(name: &str) -> Option<&'static str> {
    Some(match name {
        "id" => "id",
        "className" => "class",
        "title" => "title",
        "lang" => "lang",
        "dir" => "dir",
        "href" => "href",
        "src" => "src",
        "alt" => "alt",
        "name" => "name",
        "type" => "type",
        "placeholder" => "placeholder",
        "htmlFor" => "for",
        "rel" => "rel",
        "target" => "target",
        "action" => "action",
        "method" => "method",
        "enctype" => "enctype",
        "role" => "role",
        "style" => "style",
        "accessKey" => "accesskey",
        "autocomplete" => "autocomplete",
        "download" => "download",
        "slot" => "slot",
        "pattern" => "pattern",
        "min" => "min",
        "max" => "max",
        "step" => "step",
        _ => return None,
    })
}

fn boolean_attribute(name: &str) -> Option<&'static str> {
    Some(match name {
        "hidden" => "hidden",
        "disabled" => "disabled",
        "readOnly" => "readonly",
        "required" => "required",
        "multiple" => "multiple",
        "autofocus" => "autofocus",
        "open" => "open",
        "defaultChecked" => "checked",
        "defaultSelected" => "selected",
        "noValidate" => "novalidate",
        "formNoValidate" => "formnovalidate",
        "async" => "async",
        "defer" => "defer",
        "controls" => "controls",
        "loop" => "loop",
        "autoplay" => "autoplay",
        "inert" => "inert",
        _ => return None,
    })
}

/// Reflected integer properties with the default returned when the
/// attribute is missing or unparsable.
fn numeric_attribute(name: &str) -> Option<(&'static str, i64)> {
    Some(match name {
        "tabIndex" => ("tabindex", -1),
        "maxLength" => ("maxlength", -1),
        "minLength" => ("minlength", -1),
        "size" => ("size", 20),
        "rows" => ("rows", 2),
        "cols" => ("cols", 20),
        "colSpan" => ("colspan", 1),
        "rowSpan" => ("rowspan", 1),
        "width" => ("width", 0),
        "height" => ("height", 0),
        _ => return None,
    })
}

fn is_read_only(name: &str) -> bool {
    matches!(
        name,
        "tagName"
            | "nodeName"
            | "nodeType"
            | "localName"
            | "parentNode"
            | "parentElement"
            | "childNodes"
            | "children"
            | "firstChild"
            | "lastChild"
            | "nextSibling"
            | "previousSibling"
            | "ownerDocument"
            | "isConnected"
            | "attributes"
            | "form"
    )
}

fn is_focusable_by_default(name: &str) -> bool {
    matches!(name, "a" | "button" | "input" | "select" | "textarea")
}

impl Document {
    /// Read property `name` of `id`. Unknown properties read as `Null`.
    pub fn get_property(&self, id: NodeId, name: &str) -> PropertyValue {
        match (self.data(id), name) {
            (None, _) => return PropertyValue::Null,
            (_, "nodeName") => return self.node_name(id).into(),
            (_, "nodeType") => return PropertyValue::Number(f64::from(self.node_type(id))),
            (_, "textContent") => {
                return match self.data(id) {
                    Some(NodeData::Document | NodeData::Doctype { .. }) => PropertyValue::Null,
                    _ => self.text_content(id).into(),
                };
            }
            (Some(NodeData::Text(s) | NodeData::Comment(s)), "nodeValue" | "data") => {
                return s.as_str().into();
            }
            (Some(NodeData::Element(_)), _) => {}
            _ => return PropertyValue::Null,
        }

        let tag = self.tag_name(id).unwrap_or_default();
        match name {
            "tagName" => return tag.to_ascii_uppercase().into(),
            "localName" => return tag.into(),
            "innerHTML" => return self.inner_html(id).into(),
            "outerHTML" => return self.outer_html(id).into(),
            "innerText" => return self.inner_text(id).into(),
            "value" => return self.value(id).into(),
            "checked" => return self.checked(id).into(),
            "selected" => return self.selected(id).into(),
            "selectionStart" => return (self.selection(id).0 as i64).into(),
            "selectionEnd" => return (self.selection(id).1 as i64).into(),
            "isConnected" => return self.is_connected(id).into(),
            "type" if tag == "input" => return self.input_type(id).into(),
            "type" if tag == "button" => {
                return self
                    .get_attribute(id, "type")
                    .map(str::to_ascii_lowercase)
                    .filter(|t| matches!(t.as_str(), "submit" | "reset" | "button"))
                    .unwrap_or_else(|| "submit".to_string())
                    .into();
            }
            "defaultValue" if tag == "textarea" => return self.text_content(id).into(),
            "defaultValue" => return self.get_attribute(id, "value").unwrap_or_default().into(),
            _ => {}
        }

        if let Some(attr) = reflected_attribute(name) {
            return self.get_attribute(id, attr).unwrap_or_default().into();
        }
        if let Some(attr) = boolean_attribute(name) {
            return self.has_attribute(id, attr).into();
        }
        if let Some((attr, fallback)) = numeric_attribute(name) {
            let fallback = if name == "tabIndex" && is_focusable_by_default(tag) {
                0
            } else {
                fallback
            };
            let parsed = self
                .get_attribute(id, attr)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(fallback);
            return parsed.into();
        }

        self.element(id)
            .and_then(|el| el.props.get(name).cloned())
            .unwrap_or(PropertyValue::Null)
    }

    /// Assign property `name` of `id`. Read-only properties are ignored.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), DomError> {
        match (self.data(id), name) {
            (None, _) => return Ok(()),
            (_, "textContent") => {
                self.set_text_content(id, &value.to_dom_string());
                return Ok(());
            }
            (Some(NodeData::Text(_) | NodeData::Comment(_)), "nodeValue" | "data") => {
                self.set_character_data(id, &value.to_dom_string());
                return Ok(());
            }
            (Some(NodeData::Element(_)), _) => {}
            (Some(NodeData::Fragment), "innerHTML") => {}
            _ => return Ok(()),
        }
        if is_read_only(name) {
            return Ok(());
        }

        match name {
            "innerHTML" => return self.set_inner_html(id, &value.to_dom_string()),
            "outerHTML" => return self.set_outer_html(id, &value.to_dom_string()),
            "innerText" | "outerText" => {
                self.set_inner_text(id, &value.to_dom_string());
                return Ok(());
            }
            "value" => {
                self.set_value(id, &value.to_dom_string());
                return Ok(());
            }
            "checked" => {
                self.set_checked(id, value.is_truthy());
                return Ok(());
            }
            "selected" => {
                self.set_selected(id, value.is_truthy());
                return Ok(());
            }
            "selectionStart" | "selectionEnd" => {
                let (start, end) = self.selection(id);
                let offset = value.to_number();
                let offset = if offset.is_finite() && offset > 0.0 {
                    offset as usize
                } else {
                    0
                };
                if name == "selectionStart" {
                    self.set_selection_range(id, offset, end.max(offset));
                } else {
                    self.set_selection_range(id, start.min(offset), offset);
                }
                return Ok(());
            }
            "defaultValue" if self.tag_name(id) == Some("textarea") => {
                self.set_text_content(id, &value.to_dom_string());
                return Ok(());
            }
            "defaultValue" => return self.set_attribute(id, "value", &value.to_dom_string()),
            _ => {}
        }

        if let Some(attr) = reflected_attribute(name) {
            return self.set_attribute(id, attr, &value.to_js_string());
        }
        if let Some(attr) = boolean_attribute(name) {
            if value.is_truthy() {
                return self.set_attribute(id, attr, "");
            }
            self.remove_attribute(id, attr);
            return Ok(());
        }
        if let Some((attr, _)) = numeric_attribute(name) {
            let n = value.to_number();
            let n = if n.is_finite() { n.trunc() as i64 } else { 0 };
            return self.set_attribute(id, attr, &n.to_string());
        }

        if let Some(el) = self.element_mut(id) {
            el.props.insert(name.to_string(), value.clone());
        }
        Ok(())
    }
}
