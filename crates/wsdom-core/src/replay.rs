//! Applying mutations to a mirror document.
//!
//! Every mutation resolves its references first. A reference that does not
//! resolve makes the mutation a no-op: the stream tolerates gaps, for
//! example a node removed locally before a mutation naming it arrives.

use tracing::{debug, warn};
use wsdom_dom::{Document, DomError, NodeId, NodeOrText, PropertyValue};
use wsdom_protocols::{Mutation, NodeRef, PrependItem, StashId};

use crate::resolver::NodeStash;

/// Apply `mutation` to `doc`. Returns `false` when it was skipped.
pub fn apply_mutation(doc: &mut Document, stash: &mut NodeStash, mutation: &Mutation) -> bool {
    match try_apply(doc, stash, mutation) {
        Ok(true) => true,
        Ok(false) => {
            debug!("Skipping {}: reference not found", mutation.tag());
            false
        }
        Err(e) => {
            warn!("Failed to apply {}: {}", mutation.tag(), e);
            false
        }
    }
}

/// Apply every mutation in order. Returns how many were applied.
pub fn apply_all<'a>(
    doc: &mut Document,
    stash: &mut NodeStash,
    mutations: impl IntoIterator<Item = &'a Mutation>,
) -> usize {
    mutations
        .into_iter()
        .filter(|m| apply_mutation(doc, stash, m))
        .count()
}

fn stashed(doc: &Document, stash: &NodeStash, id: StashId) -> Option<NodeId> {
    stash.get(doc, &NodeRef::stashed(id))
}

fn try_apply(
    doc: &mut Document,
    stash: &mut NodeStash,
    mutation: &Mutation,
) -> Result<bool, DomError> {
    match mutation {
        Mutation::CreateElement { tag_name, id, is } => {
            let node = doc.create_element(tag_name, is.as_deref());
            stash.stash(node, Some(*id));
        }
        Mutation::CreateTextNode { data, id } => {
            let node = doc.create_text_node(data);
            stash.stash(node, Some(*id));
        }
        Mutation::CreateDocumentFragment { id } => {
            let node = doc.create_document_fragment();
            stash.stash(node, Some(*id));
        }
        Mutation::RemoveElement { target } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.remove(node);
        }
        Mutation::AppendChild { parent, child } => {
            let (Some(parent), Some(node)) = (stash.get(doc, parent), stashed(doc, stash, *child))
            else {
                return Ok(false);
            };
            doc.append_child(parent, node)?;
            stash.unstash(&NodeRef::stashed(*child));
        }
        Mutation::RemoveChild { parent, child } => {
            let (Some(parent), Some(node)) = (stash.get(doc, parent), stash.get(doc, child)) else {
                return Ok(false);
            };
            doc.remove_child(parent, node)?;
        }
        Mutation::SetAttribute {
            target,
            name,
            value,
        } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.set_attribute(node, name, value)?;
        }
        Mutation::SetProperty {
            target,
            name,
            value,
        } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.set_property(node, name, &PropertyValue::coerce(name, value))?;
        }
        Mutation::CloneNode {
            target,
            clone_id,
            deep,
        } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            let copy = doc.clone_node(node, *deep);
            stash.stash(copy, Some(*clone_id));
        }
        Mutation::InsertAdjacentElement {
            target,
            position,
            element,
        } => {
            let (Some(node), Some(inserted)) =
                (stash.get(doc, target), stashed(doc, stash, *element))
            else {
                return Ok(false);
            };
            if doc.insert_adjacent_element(node, *position, inserted)?.is_none() {
                return Ok(false);
            }
            stash.unstash(&NodeRef::stashed(*element));
        }
        Mutation::InsertAdjacentHtml {
            target,
            position,
            html,
        } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.insert_adjacent_html(node, *position, html)?;
        }
        Mutation::InsertAdjacentText {
            target,
            position,
            text,
        } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.insert_adjacent_text(node, *position, text)?;
        }
        Mutation::PrependChild { parent, child } => {
            let Some(parent) = stash.get(doc, parent) else {
                return Ok(false);
            };
            match child {
                PrependItem::Stashed(id) => {
                    let Some(node) = stashed(doc, stash, *id) else {
                        return Ok(false);
                    };
                    doc.prepend(parent, vec![NodeOrText::Node(node)])?;
                    stash.unstash(&NodeRef::stashed(*id));
                }
                PrependItem::Text(text) => {
                    doc.prepend(parent, vec![NodeOrText::Text(text.clone())])?;
                }
            }
        }
        Mutation::Normalize { target } => {
            let Some(node) = stash.get(doc, target) else {
                return Ok(false);
            };
            doc.normalize(node);
        }
    }
    Ok(true)
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
