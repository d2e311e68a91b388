//! Structural node paths.
//!
//! Paths use three anchors: the id short form `//*[@id="x"]`, the absolute
//! root `/`, and the fixed `/html`, `/html/head`, `/html/body` prefixes that
//! fall out of the absolute form. Steps are `name[n]` (1-based among element
//! siblings with the same local name) and `text()[n]` (1-based among text
//! siblings).

use std::fmt::Write as _;

use tracing::debug;
use wsdom_dom::{Document, DomError, NodeData, NodeId};

const ID_PREFIX: &str = "//*[@id=\"";
const ID_SUFFIX: &str = "\"]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
    Root,
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Element { name: String, index: usize },
    Text { index: usize },
}

/// A parsed node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathExpr {
    anchor: Anchor,
    steps: Vec<Step>,
}

fn parse_index(step: &str, predicate: &str) -> Result<usize, DomError> {
    let inner = predicate
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .ok_or_else(|| DomError::Syntax(format!("bad predicate in step {:?}", step)))?;
    match inner.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(DomError::Syntax(format!(
            "expected a positive index in step {:?}",
            step
        ))),
        Ok(index) => Ok(index),
    }
}

fn parse_step(step: &str) -> Result<Step, DomError> {
    if let Some(rest) = step.strip_prefix("text()") {
        let index = if rest.is_empty() { 1 } else { parse_index(step, rest)? };
        return Ok(Step::Text { index });
    }
    let (name, predicate) = match step.find('[') {
        Some(at) => (&step[..at], Some(&step[at..])),
        None => (step, None),
    };
    let valid_name = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'));
    if !valid_name {
        return Err(DomError::Syntax(format!("bad step {:?}", step)));
    }
    let index = match predicate {
        Some(p) => parse_index(step, p)?,
        None => 1,
    };
    Ok(Step::Element {
        name: name.to_ascii_lowercase(),
        index,
    })
}

impl XPathExpr {
    pub fn parse(path: &str) -> Result<Self, DomError> {
        let (anchor, rest) = if let Some(after) = path.strip_prefix(ID_PREFIX) {
            let end = after
                .find(ID_SUFFIX)
                .ok_or_else(|| DomError::Syntax(format!("unterminated id in {:?}", path)))?;
            (
                Anchor::Id(after[..end].to_string()),
                &after[end + ID_SUFFIX.len()..],
            )
        } else if path.starts_with('/') && !path.starts_with("//") {
            (Anchor::Root, path)
        } else {
            return Err(DomError::Syntax(format!("unsupported path {:?}", path)));
        };

        if rest.is_empty() {
            if anchor == Anchor::Root {
                return Err(DomError::Syntax("empty path".to_string()));
            }
            return Ok(Self {
                anchor,
                steps: Vec::new(),
            });
        }
        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| DomError::Syntax(format!("expected '/' in {:?}", path)))?;
        let steps = rest.split('/').map(parse_step).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { anchor, steps })
    }

    /// First node matching this path in `doc`.
    pub fn evaluate(&self, doc: &Document) -> Option<NodeId> {
        let mut current = match &self.anchor {
            Anchor::Root => doc.root(),
            Anchor::Id(id) => doc.get_element_by_id(id)?,
        };
        for step in &self.steps {
            current = match step {
                Step::Element { name, index } => doc
                    .children(current)
                    .iter()
                    .copied()
                    .filter(|&c| doc.tag_name(c) == Some(name.as_str()))
                    .nth(index - 1)?,
                Step::Text { index } => doc
                    .children(current)
                    .iter()
                    .copied()
                    .filter(|&c| doc.is_text(c))
                    .nth(index - 1)?,
            };
        }
        Some(current)
    }
}

/// Resolve `path` against `doc`. Malformed paths resolve to nothing.
pub fn evaluate_xpath(doc: &Document, path: &str) -> Option<NodeId> {
    match XPathExpr::parse(path) {
        Ok(expr) => expr.evaluate(doc),
        Err(e) => {
            debug!("Unresolvable xpath {}: {}", path, e);
            None
        }
    }
}

/// Structural path of `node`, or `None` when it is not reachable from the
/// document root or is not an element or text node.
pub fn compute_xpath(doc: &Document, node: NodeId) -> Option<String> {
    if !doc.is_connected(node) {
        return None;
    }
    path_of(doc, node)
}

fn path_of(doc: &Document, node: NodeId) -> Option<String> {
    match doc.data(node)? {
        NodeData::Text(_) => {
            let parent = doc.parent(node)?;
            let index = 1 + doc
                .children(parent)
                .iter()
                .take_while(|&&c| c != node)
                .filter(|&&c| doc.is_text(c))
                .count();
            let mut path = path_of(doc, parent)?;
            let _ = write!(path, "/text()[{}]", index);
            Some(path)
        }
        NodeData::Element(el) => {
            if let Some(id) = el.attr("id").filter(|id| !id.is_empty()) {
                return Some(format!("{}{}{}", ID_PREFIX, id, ID_SUFFIX));
            }
            if Some(node) == doc.body() {
                return Some("/html/body".to_string());
            }
            if Some(node) == doc.head() {
                return Some("/html/head".to_string());
            }
            if Some(node) == doc.document_element() {
                return Some("/html".to_string());
            }
            let parent = doc.parent(node)?;
            if !doc.is_element(parent) {
                return None;
            }
            let index = 1 + doc
                .children(parent)
                .iter()
                .take_while(|&&c| c != node)
                .filter(|&&c| doc.tag_name(c) == Some(el.name.as_str()))
                .count();
            let mut path = path_of(doc, parent)?;
            let _ = write!(path, "/{}[{}]", el.name, index);
            Some(path)
        }
        _ => None,
    }
}
