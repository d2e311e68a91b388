//! Mutation interception.
//!
//! [`InstrumentedDom`] decorates a [`Document`] so that every call through
//! [`DomCapabilities`] also emits one [`Mutation`] describing it. Creation
//! operations stash the new node and always emit. Every other operation
//! emits only when the acting node can be named: references are computed
//! before the operation runs, so they name nodes as the receiving side
//! still sees them.

mod listeners;
mod sink;

pub use listeners::{EventContext, ListenerId};
pub use sink::{MutationLog, MutationSink};

use std::rc::Rc;

use tracing::trace;
use wsdom_dom::{Document, DomCapabilities, DomError, Event, NodeId, NodeOrText, PropertyValue};
use wsdom_protocols::{InsertPosition, Mutation, NodeRef, PrependItem, StashId};

use crate::resolver::NodeStash;
use listeners::ListenerRegistry;

/// A document whose mutations are observed.
pub struct InstrumentedDom {
    doc: Document,
    stash: NodeStash,
    sink: Box<dyn MutationSink>,
    listeners: ListenerRegistry,
}

impl InstrumentedDom {
    pub fn new(doc: Document, sink: impl MutationSink + 'static) -> Self {
        Self {
            doc,
            stash: NodeStash::new(),
            sink: Box::new(sink),
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn stash(&self) -> &NodeStash {
        &self.stash
    }

    /// Swap in a new document. Stash entries and listeners belong to the old
    /// tree and are dropped.
    pub fn replace_document(&mut self, doc: Document) {
        self.doc = doc;
        self.stash.clear();
        self.listeners.clear();
    }

    /// Wire name for `node`, if it has one.
    pub fn find_ref(&self, node: NodeId) -> Option<NodeRef> {
        self.stash.find_ref_for(&self.doc, node)
    }

    /// Resolve a wire reference.
    pub fn resolve(&self, node_ref: &NodeRef) -> Option<NodeId> {
        self.stash.get(&self.doc, node_ref)
    }

    pub fn get_property(&self, node: NodeId, name: &str) -> PropertyValue {
        self.doc.get_property(node, name)
    }

    /// Move the text selection. Selection is local state and is not mirrored.
    pub fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize) {
        self.doc.set_selection_range(node, start, end);
    }

    fn emit(&mut self, mutation: Mutation) {
        trace!("Emitting mutation: {}", mutation.tag());
        self.sink.emit(mutation);
    }

    fn stash_new(&mut self, node: NodeId) -> StashId {
        let node_ref = self.stash.stash(node, None);
        node_ref.stash_id().unwrap_or_default()
    }

    /// Emit the structural mutation built by `build` when the acting node was
    /// nameable, and release the inserted node's stash entry.
    fn emit_insertion(
        &mut self,
        target: Option<NodeRef>,
        inserted: Option<StashId>,
        build: impl FnOnce(NodeRef, StashId) -> Mutation,
    ) {
        if let (Some(target), Some(id)) = (target, inserted) {
            self.emit(build(target, id));
            self.stash.unstash(&NodeRef::stashed(id));
        }
    }

    // === Events ===

    /// Register `listener` for `event_type` events reaching `node`.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: impl Fn(&mut InstrumentedDom, &mut EventContext) + 'static,
    ) -> ListenerId {
        self.listeners.add(node, event_type, Rc::new(listener))
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch `event` at `target`, then up the ancestor chain while it
    /// bubbles. Returns the event as the last listener left it.
    pub fn dispatch_event(&mut self, target: NodeId, event: Event) -> Event {
        let mut path = vec![target];
        let mut cursor = self.doc.parent(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.doc.parent(node);
        }

        let mut ctx = EventContext {
            event,
            target,
            current_target: target,
        };
        for node in path {
            if node != target && !ctx.event.bubbles {
                break;
            }
            ctx.current_target = node;
            for listener in self.listeners.matching(node, &ctx.event.event_type) {
                (*listener)(self, &mut ctx);
            }
            if ctx.event.propagation_stopped() {
                break;
            }
        }
        ctx.event
    }
}

impl std::fmt::Debug for InstrumentedDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedDom")
            .field("stash", &self.stash)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl DomCapabilities for InstrumentedDom {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn create_element(&mut self, tag_name: &str, is: Option<&str>) -> NodeId {
        let node = self.doc.create_element(tag_name, is);
        let id = self.stash_new(node);
        self.emit(Mutation::CreateElement {
            tag_name: tag_name.to_string(),
            id,
            is: is.map(str::to_string),
        });
        node
    }

    fn create_text_node(&mut self, data: &str) -> NodeId {
        let node = self.doc.create_text_node(data);
        let id = self.stash_new(node);
        self.emit(Mutation::CreateTextNode {
            data: data.to_string(),
            id,
        });
        node
    }

    fn create_document_fragment(&mut self) -> NodeId {
        let node = self.doc.create_document_fragment();
        let id = self.stash_new(node);
        self.emit(Mutation::CreateDocumentFragment { id });
        node
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let parent_ref = self.find_ref(parent);
        let child_id = self.stash.id_of(child);
        let appended = self.doc.append_child(parent, child)?;
        self.emit_insertion(parent_ref, child_id, |parent, child| Mutation::AppendChild {
            parent,
            child,
        });
        Ok(appended)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let parent_ref = self.find_ref(parent);
        let child_ref = self.find_ref(child);
        let removed = self.doc.remove_child(parent, child)?;
        if let (Some(parent), Some(child)) = (parent_ref, child_ref) {
            self.emit(Mutation::RemoveChild { parent, child });
        }
        Ok(removed)
    }

    fn remove(&mut self, node: NodeId) {
        let target = self.find_ref(node);
        self.doc.remove(node);
        if let Some(target) = target {
            self.emit(Mutation::RemoveElement { target });
        }
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let source = self.find_ref(node);
        let copy = self.doc.clone_node(node, deep);
        let clone_id = self.stash_new(copy);
        if let Some(target) = source {
            self.emit(Mutation::CloneNode {
                target,
                clone_id,
                deep,
            });
        }
        copy
    }

    fn insert_adjacent_element(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        element: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        let target_ref = self.find_ref(target);
        let element_id = self.stash.id_of(element);
        let inserted = self.doc.insert_adjacent_element(target, position, element)?;
        if inserted.is_some() {
            self.emit_insertion(target_ref, element_id, |target, element| {
                Mutation::InsertAdjacentElement {
                    target,
                    position,
                    element,
                }
            });
        }
        Ok(inserted)
    }

    fn insert_adjacent_html(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        html: &str,
    ) -> Result<(), DomError> {
        let target_ref = self.find_ref(target);
        self.doc.insert_adjacent_html(target, position, html)?;
        if let Some(target) = target_ref {
            self.emit(Mutation::InsertAdjacentHtml {
                target,
                position,
                html: html.to_string(),
            });
        }
        Ok(())
    }

    fn insert_adjacent_text(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        text: &str,
    ) -> Result<(), DomError> {
        let target_ref = self.find_ref(target);
        self.doc.insert_adjacent_text(target, position, text)?;
        if let Some(target) = target_ref {
            self.emit(Mutation::InsertAdjacentText {
                target,
                position,
                text: text.to_string(),
            });
        }
        Ok(())
    }

    fn prepend(&mut self, parent: NodeId, items: Vec<NodeOrText>) -> Result<(), DomError> {
        let parent_ref = self.find_ref(parent);
        let wire_items: Vec<PrependItem> = items
            .iter()
            .filter_map(|item| match item {
                NodeOrText::Node(node) => self.stash.id_of(*node).map(PrependItem::Stashed),
                NodeOrText::Text(text) => Some(PrependItem::Text(text.clone())),
            })
            .collect();
        self.doc.prepend(parent, items)?;

        let Some(parent_ref) = parent_ref else {
            return Ok(());
        };
        // Each record prepends on replay, so the last item goes first.
        for child in wire_items.into_iter().rev() {
            if let PrependItem::Stashed(id) = child {
                self.stash.unstash(&NodeRef::stashed(id));
            }
            self.emit(Mutation::PrependChild {
                parent: parent_ref.clone(),
                child,
            });
        }
        Ok(())
    }

    fn normalize(&mut self, node: NodeId) {
        let target = self.find_ref(node);
        self.doc.normalize(node);
        if let Some(target) = target {
            self.emit(Mutation::Normalize { target });
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let target = self.find_ref(node);
        self.doc.set_attribute(node, name, value)?;
        if let Some(target) = target {
            self.emit(Mutation::SetAttribute {
                target,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), DomError> {
        let target = self.find_ref(node);
        self.doc.set_property(node, name, &value)?;
        if matches!(name, "innerHTML" | "textContent" | "innerText") {
            self.stash.retain_live(&self.doc);
            self.listeners.retain_live(&self.doc);
        }
        let serializable = !name.starts_with("on") && !value.is_function();
        if let (Some(target), true) = (target, serializable) {
            self.emit(Mutation::SetProperty {
                target,
                name: name.to_string(),
                value: value.to_js_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "instrumented_tests.rs"]
mod tests;
