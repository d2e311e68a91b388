//! Arena-backed document tree.
//!
//! Detaching a node only unlinks it, so a removed node keeps its identity and
//! can be inserted again. Children discarded by `innerHTML`, `textContent`
//! or `innerText` writes are released instead: their slots are reused and any
//! [`NodeId`] still pointing into them resolves to nothing.

use wsdom_protocols::InsertPosition;

use crate::error::DomError;
use crate::html;
use crate::node::{Attribute, ElementData, Node, NodeData, NodeId};

/// Default document used when none is supplied.
pub const BLANK_DOCUMENT: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    url: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::parse(BLANK_DOCUMENT, "about:blank")
    }
}

impl Document {
    /// Document node only, without `<html>`.
    pub(crate) fn bare(url: &str) -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new(NodeData::Document)),
            }],
            free: Vec::new(),
            root: NodeId::from_index(0),
            url: url.to_string(),
        }
    }

    /// Parse a full HTML document. `<html>`, `<head>` and `<body>` always exist
    /// afterwards.
    pub fn parse(source: &str, url: &str) -> Self {
        html::parse_document(source, url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    // === Arena access ===

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Some(Node::new(data));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = node;
            return NodeId::new(index, slot.generation);
        }
        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId::new(self.slots.len() - 1, 0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Free the detached node `id` and its subtree. Attached nodes and the
    /// document node are left alone.
    pub fn release(&mut self, id: NodeId) {
        if id == self.root || self.parent(id).is_some() {
            return;
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index())
                .filter(|slot| slot.generation == next.generation())
            else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(next.index());
            pending.extend(node.children);
        }
    }

    /// Nodes currently allocated, attached or not.
    pub fn live_nodes(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Slots in the arena, including free ones.
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(Node::data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.node_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    // === Navigation ===

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    /// Element children of `id`.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// First element child of `parent` with local name `name`.
    pub fn child_element_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.tag_name(c) == Some(name))
    }

    /// Preorder descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether `id` is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.child_element_named(self.root, "html")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.document_element()
            .and_then(|html| self.child_element_named(html, "head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.document_element()
            .and_then(|html| self.child_element_named(html, "body"))
    }

    // === Node inspection ===

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element(_)))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Fragment))
    }

    /// Lowercase local name, for elements.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// DOM `nodeName`.
    pub fn node_name(&self, id: NodeId) -> String {
        match self.data(id) {
            Some(NodeData::Element(el)) => el.name.to_ascii_uppercase(),
            Some(NodeData::Text(_)) => "#text".to_string(),
            Some(NodeData::Comment(_)) => "#comment".to_string(),
            Some(NodeData::Document) => "#document".to_string(),
            Some(NodeData::Fragment) => "#document-fragment".to_string(),
            Some(NodeData::Doctype { name }) => name.clone(),
            None => String::new(),
        }
    }

    /// DOM `nodeType` constant.
    pub fn node_type(&self, id: NodeId) -> u16 {
        match self.data(id) {
            Some(NodeData::Element(_)) => 1,
            Some(NodeData::Text(_)) => 3,
            Some(NodeData::Comment(_)) => 8,
            Some(NodeData::Document) => 9,
            Some(NodeData::Doctype { .. }) => 10,
            Some(NodeData::Fragment) => 11,
            None => 0,
        }
    }

    /// Character data of a text or comment node.
    pub fn character_data(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(s)) | Some(NodeData::Comment(s)) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn set_character_data(&mut self, id: NodeId, value: &str) {
        if let Some(node) = self.node_mut(id) {
            match &mut node.data {
                NodeData::Text(s) | NodeData::Comment(s) => {
                    s.clear();
                    s.push_str(value);
                }
                _ => {}
            }
        }
    }

    // === Creation ===

    pub fn create_element(&mut self, name: &str, is: Option<&str>) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(name, is)))
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.alloc(NodeData::Text(data.to_string()))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(NodeData::Comment(data.to_string()))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    pub(crate) fn create_doctype(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Doctype {
            name: name.to_string(),
        })
    }

    /// Copy of `id`, and of its subtree when `deep`. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let data = match self.data(id) {
            Some(NodeData::Document) | None => NodeData::Fragment,
            Some(other) => other.clone(),
        };
        let copy = self.alloc(data);
        if deep {
            for child in self.children(id).to_vec() {
                let child_copy = self.clone_node(child, true);
                self.link(copy, child_copy, None);
            }
        }
        copy
    }

    // === Tree mutation ===

    /// Unlink `id` from its parent, if any.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Link a detached `child` into `parent` at `index` (append when `None`).
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(node) = self.node_mut(parent) {
            match index {
                Some(i) if i <= node.children.len() => node.children.insert(i, child),
                _ => node.children.push(child),
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(DomError::HierarchyRequest("unknown node".to_string()));
        }
        match self.data(parent) {
            Some(NodeData::Document | NodeData::Element(_) | NodeData::Fragment) => {}
            _ => {
                return Err(DomError::HierarchyRequest(format!(
                    "{} cannot have children",
                    self.node_name(parent)
                )));
            }
        }
        if matches!(self.data(child), Some(NodeData::Document)) {
            return Err(DomError::HierarchyRequest(
                "a document cannot be inserted".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(
                "the new child is an ancestor of the parent".to_string(),
            ));
        }
        Ok(())
    }

    /// Insert `child` into `parent` before `reference` (append when `None`).
    /// A fragment child is emptied into `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.check_insertion(parent, child)?;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };

        let moving: Vec<NodeId> = if self.is_fragment(child) {
            self.children(child).to_vec()
        } else {
            vec![child]
        };
        for node in moving {
            self.detach(node);
            let index = reference.and_then(|r| self.index_in_parent(r));
            self.link(parent, node, index);
        }
        Ok(child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, child, None)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// `ChildNode.remove()`: detach from the parent, no-op when detached.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Remove and release every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.detach(child);
            self.release(child);
        }
    }

    /// Insert `node` relative to `target`. Returns `Ok(None)` when the
    /// position needs a parent and `target` has none.
    fn insert_adjacent(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        node: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        match position {
            InsertPosition::BeforeBegin => {
                let Some(parent) = self.parent(target) else {
                    return Ok(None);
                };
                self.insert_before(parent, node, Some(target))?;
            }
            InsertPosition::AfterBegin => {
                let first = self.first_child(target);
                self.insert_before(target, node, first)?;
            }
            InsertPosition::BeforeEnd => {
                self.append_child(target, node)?;
            }
            InsertPosition::AfterEnd => {
                let Some(parent) = self.parent(target) else {
                    return Ok(None);
                };
                let next = self.next_sibling(target);
                self.insert_before(parent, node, next)?;
            }
        }
        Ok(Some(node))
    }

    pub fn insert_adjacent_element(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        element: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        if !self.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        self.insert_adjacent(target, position, element)
    }

    pub fn insert_adjacent_text(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        text: &str,
    ) -> Result<(), DomError> {
        let node = self.create_text_node(text);
        if self.insert_adjacent(target, position, node)?.is_none() {
            self.release(node);
        }
        Ok(())
    }

    pub fn insert_adjacent_html(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        markup: &str,
    ) -> Result<(), DomError> {
        let context = match position {
            InsertPosition::BeforeBegin | InsertPosition::AfterEnd => {
                match self.parent(target) {
                    Some(parent) if self.is_element(parent) => parent,
                    _ => return Err(DomError::NoParent(target)),
                }
            }
            InsertPosition::AfterBegin | InsertPosition::BeforeEnd => target,
        };
        let fragment = html::parse_fragment(self, context, markup);
        let result = self.insert_adjacent(target, position, fragment);
        self.release(fragment);
        result.map(|_| ())
    }

    /// `ParentNode.prepend()`.
    pub fn prepend(&mut self, parent: NodeId, items: Vec<NodeOrText>) -> Result<(), DomError> {
        let nodes: Vec<NodeId> = items
            .into_iter()
            .map(|item| match item {
                NodeOrText::Node(id) => id,
                NodeOrText::Text(text) => self.create_text_node(&text),
            })
            .collect();
        let (node, wrapper) = match nodes.as_slice() {
            [] => return Ok(()),
            [single] => (*single, false),
            _ => {
                let fragment = self.create_document_fragment();
                for node in nodes {
                    self.append_child(fragment, node)?;
                }
                (fragment, true)
            }
        };
        let first = self.first_child(parent);
        let result = self.insert_before(parent, node, first);
        if wrapper {
            self.release(node);
        }
        result.map(|_| ())
    }

    /// Merge adjacent text nodes and drop empty ones in the subtree of `id`.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut i = 0;
        while i < children.len() {
            let child = children[i];
            i += 1;
            if self.parent(child) != Some(id) {
                continue;
            }
            match self.data(child) {
                Some(NodeData::Text(data)) => {
                    let mut merged = data.clone();
                    while let Some(next) = self.next_sibling(child) {
                        let Some(NodeData::Text(more)) = self.data(next) else {
                            break;
                        };
                        merged.push_str(more);
                        self.detach(next);
                    }
                    if merged.is_empty() {
                        self.detach(child);
                    } else {
                        self.set_character_data(child, &merged);
                    }
                }
                Some(NodeData::Element(_) | NodeData::Fragment) => self.normalize(child),
                _ => {}
            }
        }
    }

    // === Attributes ===

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(&name.to_ascii_lowercase())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map(|el| el.attrs.as_slice()).unwrap_or(&[])
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
        let name = name.to_ascii_lowercase();
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        match el.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.value.clear();
                attr.value.push_str(value);
            }
            None => el.attrs.push(Attribute {
                name,
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self.element_mut(id) {
            Some(el) => {
                let before = el.attrs.len();
                el.attrs.retain(|a| a.name != name);
                before != el.attrs.len()
            }
            None => false,
        }
    }

    // === Queries ===

    /// First connected element, in document order, whose `id` attribute is `value`.
    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        if value.is_empty() {
            return None;
        }
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.element(n).and_then(|el| el.attr("id")) == Some(value))
    }

    /// Connected elements with local name `name`, in document order.
    pub fn get_elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        let name = name.to_ascii_lowercase();
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| name == "*" || self.tag_name(n) == Some(name.as_str()))
            .collect()
    }

    /// Nearest inclusive ancestor element named `name`.
    pub fn closest(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.tag_name(current) == Some(name) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Text of the first `<title>` element.
    pub fn title(&self) -> String {
        self.get_elements_by_tag_name("title")
            .first()
            .map(|&t| self.text_content(t).split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    // === Text and markup ===

    /// DOM `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.data(id) {
            Some(NodeData::Text(s)) | Some(NodeData::Comment(s)) => s.clone(),
            Some(NodeData::Element(_) | NodeData::Fragment) => {
                let mut out = String::new();
                for n in self.descendants(id) {
                    if let Some(NodeData::Text(s)) = self.data(n) {
                        out.push_str(s);
                    }
                }
                out
            }
            _ => String::new(),
        }
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match self.data(id) {
            Some(NodeData::Text(_) | NodeData::Comment(_)) => self.set_character_data(id, text),
            Some(NodeData::Element(_) | NodeData::Fragment) => {
                self.clear_children(id);
                if !text.is_empty() {
                    let node = self.create_text_node(text);
                    self.link(id, node, None);
                }
            }
            _ => {}
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        html::serialize_children(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        html::serialize_node(self, id)
    }

    /// Replace the children of `id` with the parsed `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), DomError> {
        if !matches!(
            self.data(id),
            Some(NodeData::Element(_) | NodeData::Fragment)
        ) {
            return Err(DomError::NotAnElement(id));
        }
        let fragment = html::parse_fragment(self, id, markup);
        self.clear_children(id);
        let result = self.append_child(id, fragment);
        self.release(fragment);
        result.map(|_| ())
    }

    /// Replace `id` in its parent with the parsed `markup`.
    pub fn set_outer_html(&mut self, id: NodeId, markup: &str) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::NoParent(id))?;
        let context = if self.is_element(parent) { parent } else { id };
        let fragment = html::parse_fragment(self, context, markup);
        let next = self.next_sibling(id);
        self.detach(id);
        let result = self.insert_before(parent, fragment, next);
        self.release(fragment);
        result.map(|_| ())
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        html::serialize_children(self, self.root)
    }
}

/// Argument of [`Document::prepend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOrText {
    Node(NodeId),
    Text(String),
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace() && !c.is_control() && !matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
        })
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
