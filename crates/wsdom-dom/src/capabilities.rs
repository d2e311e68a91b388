//! The DOM capability set that mutation instrumentation decorates.

use wsdom_protocols::InsertPosition;

use crate::document::{Document, NodeOrText};
use crate::error::DomError;
use crate::node::NodeId;
use crate::property::PropertyValue;

/// Mutating operations on a document tree.
///
/// [`Document`] implements this directly. Wrappers implement it by
/// delegating to an inner document and observing each call, so code written
/// against `DomCapabilities` runs unchanged whether or not it is observed.
pub trait DomCapabilities {
    fn document(&self) -> &Document;

    fn create_element(&mut self, tag_name: &str, is: Option<&str>) -> NodeId;
    fn create_text_node(&mut self, data: &str) -> NodeId;
    fn create_document_fragment(&mut self) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError>;
    fn remove(&mut self, node: NodeId);
    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId;

    fn insert_adjacent_element(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        element: NodeId,
    ) -> Result<Option<NodeId>, DomError>;
    fn insert_adjacent_html(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        html: &str,
    ) -> Result<(), DomError>;
    fn insert_adjacent_text(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        text: &str,
    ) -> Result<(), DomError>;

    fn prepend(&mut self, parent: NodeId, items: Vec<NodeOrText>) -> Result<(), DomError>;
    fn normalize(&mut self, node: NodeId);

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;
    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), DomError>;
}

impl DomCapabilities for Document {
    fn document(&self) -> &Document {
        self
    }

    fn create_element(&mut self, tag_name: &str, is: Option<&str>) -> NodeId {
        Document::create_element(self, tag_name, is)
    }

    fn create_text_node(&mut self, data: &str) -> NodeId {
        Document::create_text_node(self, data)
    }

    fn create_document_fragment(&mut self) -> NodeId {
        Document::create_document_fragment(self)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        Document::append_child(self, parent, child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        Document::remove_child(self, parent, child)
    }

    fn remove(&mut self, node: NodeId) {
        Document::remove(self, node)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        Document::clone_node(self, node, deep)
    }

    fn insert_adjacent_element(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        element: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        Document::insert_adjacent_element(self, target, position, element)
    }

    fn insert_adjacent_html(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        html: &str,
    ) -> Result<(), DomError> {
        Document::insert_adjacent_html(self, target, position, html)
    }

    fn insert_adjacent_text(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        text: &str,
    ) -> Result<(), DomError> {
        Document::insert_adjacent_text(self, target, position, text)
    }

    fn prepend(&mut self, parent: NodeId, items: Vec<NodeOrText>) -> Result<(), DomError> {
        Document::prepend(self, parent, items)
    }

    fn normalize(&mut self, node: NodeId) {
        Document::normalize(self, node)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        Document::set_attribute(self, node, name, value)
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), DomError> {
        Document::set_property(self, node, name, &value)
    }
}
