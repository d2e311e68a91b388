//! Mutation records and their positional wire form.
//!
//! Every mutation is encoded as a JSON array whose first element is the type
//! tag, followed by the variant's fields in a fixed order:
//!
//! | Tag | Layout |
//! |---|---|
//! | `createElement` | `[tag, tagName, id, is \| null]` |
//! | `createTextNode` | `[tag, data, id]` |
//! | `createDocumentFragment` | `[tag, id]` |
//! | `removeElement` | `[tag, ref]` |
//! | `appendChild` | `[tag, parentRef, childId]` |
//! | `removeChild` | `[tag, parentRef, childRef]` |
//! | `setAttribute` | `[tag, ref, name, value]` |
//! | `setProperty` | `[tag, ref, name, value]` |
//! | `cloneNode` | `[tag, ref, cloneId, deep]` |
//! | `insertAdjacentElement` | `[tag, ref, position, elementId]` |
//! | `insertAdjacentHTML` | `[tag, ref, position, html]` |
//! | `insertAdjacentText` | `[tag, ref, position, text]` |
//! | `prependChild` | `[tag, parentRef, childId \| text]` |
//! | `normalize` | `[tag, ref]` |
//!
//! Decoders ignore trailing elements so variants can grow by appending fields.

use std::fmt;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::ProtocolError;
use crate::node_ref::{NodeRef, StashId};

/// Position argument of the `insertAdjacent*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl InsertPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
        }
    }

    /// Parse a position, case-insensitively like the DOM does.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "beforebegin" => Some(Self::BeforeBegin),
            "afterbegin" => Some(Self::AfterBegin),
            "beforeend" => Some(Self::BeforeEnd),
            "afterend" => Some(Self::AfterEnd),
            _ => None,
        }
    }
}

/// Prepended item: a stashed node or literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrependItem {
    Stashed(StashId),
    Text(String),
}

/// One replayable DOM state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement {
        tag_name: String,
        id: StashId,
        /// Customized built-in element name.
        is: Option<String>,
    },
    CreateTextNode {
        data: String,
        id: StashId,
    },
    CreateDocumentFragment {
        id: StashId,
    },
    RemoveElement {
        target: NodeRef,
    },
    AppendChild {
        parent: NodeRef,
        child: StashId,
    },
    RemoveChild {
        parent: NodeRef,
        child: NodeRef,
    },
    SetAttribute {
        target: NodeRef,
        name: String,
        value: String,
    },
    SetProperty {
        target: NodeRef,
        name: String,
        value: String,
    },
    CloneNode {
        target: NodeRef,
        clone_id: StashId,
        deep: bool,
    },
    InsertAdjacentElement {
        target: NodeRef,
        position: InsertPosition,
        element: StashId,
    },
    InsertAdjacentHtml {
        target: NodeRef,
        position: InsertPosition,
        html: String,
    },
    InsertAdjacentText {
        target: NodeRef,
        position: InsertPosition,
        text: String,
    },
    PrependChild {
        parent: NodeRef,
        child: PrependItem,
    },
    Normalize {
        target: NodeRef,
    },
}

/// Discriminant of [`Mutation`], carrying the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateElement,
    CreateTextNode,
    CreateDocumentFragment,
    RemoveElement,
    AppendChild,
    RemoveChild,
    SetAttribute,
    SetProperty,
    CloneNode,
    InsertAdjacentElement,
    InsertAdjacentHtml,
    InsertAdjacentText,
    PrependChild,
    Normalize,
}

impl MutationKind {
    pub const ALL: [MutationKind; 14] = [
        Self::CreateElement,
        Self::CreateTextNode,
        Self::CreateDocumentFragment,
        Self::RemoveElement,
        Self::AppendChild,
        Self::RemoveChild,
        Self::SetAttribute,
        Self::SetProperty,
        Self::CloneNode,
        Self::InsertAdjacentElement,
        Self::InsertAdjacentHtml,
        Self::InsertAdjacentText,
        Self::PrependChild,
        Self::Normalize,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::CreateElement => "createElement",
            Self::CreateTextNode => "createTextNode",
            Self::CreateDocumentFragment => "createDocumentFragment",
            Self::RemoveElement => "removeElement",
            Self::AppendChild => "appendChild",
            Self::RemoveChild => "removeChild",
            Self::SetAttribute => "setAttribute",
            Self::SetProperty => "setProperty",
            Self::CloneNode => "cloneNode",
            Self::InsertAdjacentElement => "insertAdjacentElement",
            Self::InsertAdjacentHtml => "insertAdjacentHTML",
            Self::InsertAdjacentText => "insertAdjacentText",
            Self::PrependChild => "prependChild",
            Self::Normalize => "normalize",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Number of payload fields after the tag.
    fn arity(self) -> usize {
        match self {
            Self::CreateDocumentFragment | Self::RemoveElement | Self::Normalize => 1,
            Self::CreateTextNode | Self::AppendChild | Self::RemoveChild | Self::PrependChild => 2,
            Self::CreateElement
            | Self::SetAttribute
            | Self::SetProperty
            | Self::CloneNode
            | Self::InsertAdjacentElement
            | Self::InsertAdjacentHtml
            | Self::InsertAdjacentText => 3,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::CreateElement { .. } => MutationKind::CreateElement,
            Self::CreateTextNode { .. } => MutationKind::CreateTextNode,
            Self::CreateDocumentFragment { .. } => MutationKind::CreateDocumentFragment,
            Self::RemoveElement { .. } => MutationKind::RemoveElement,
            Self::AppendChild { .. } => MutationKind::AppendChild,
            Self::RemoveChild { .. } => MutationKind::RemoveChild,
            Self::SetAttribute { .. } => MutationKind::SetAttribute,
            Self::SetProperty { .. } => MutationKind::SetProperty,
            Self::CloneNode { .. } => MutationKind::CloneNode,
            Self::InsertAdjacentElement { .. } => MutationKind::InsertAdjacentElement,
            Self::InsertAdjacentHtml { .. } => MutationKind::InsertAdjacentHtml,
            Self::InsertAdjacentText { .. } => MutationKind::InsertAdjacentText,
            Self::PrependChild { .. } => MutationKind::PrependChild,
            Self::Normalize { .. } => MutationKind::Normalize,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind().tag()
    }

    /// Stash id introduced by this mutation, if it creates a node.
    pub fn created_id(&self) -> Option<StashId> {
        match self {
            Self::CreateElement { id, .. }
            | Self::CreateTextNode { id, .. }
            | Self::CreateDocumentFragment { id } => Some(*id),
            Self::CloneNode { clone_id, .. } => Some(*clone_id),
            _ => None,
        }
    }

    /// `SetProperty` replacing the body's content with `html`.
    pub fn body_snapshot(html: impl Into<String>) -> Self {
        Self::SetProperty {
            target: NodeRef::body(),
            name: "innerHTML".to_string(),
            value: html.into(),
        }
    }

    /// Decode a single positional mutation from a JSON value.
    pub fn decode(value: serde_json::Value) -> Result<Self, ProtocolError> {
        let tag = value
            .get(0)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidMessage("mutation without tag".to_string()))?;
        if MutationKind::from_tag(tag).is_none() {
            return Err(ProtocolError::UnknownTag {
                kind: "mutation",
                tag: tag.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl Serialize for Mutation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.kind();
        let mut seq = serializer.serialize_seq(Some(kind.arity() + 1))?;
        seq.serialize_element(kind.tag())?;
        match self {
            Self::CreateElement { tag_name, id, is } => {
                seq.serialize_element(tag_name)?;
                seq.serialize_element(id)?;
                seq.serialize_element(is)?;
            }
            Self::CreateTextNode { data, id } => {
                seq.serialize_element(data)?;
                seq.serialize_element(id)?;
            }
            Self::CreateDocumentFragment { id } => seq.serialize_element(id)?,
            Self::RemoveElement { target } | Self::Normalize { target } => {
                seq.serialize_element(target)?
            }
            Self::AppendChild { parent, child } => {
                seq.serialize_element(parent)?;
                seq.serialize_element(child)?;
            }
            Self::RemoveChild { parent, child } => {
                seq.serialize_element(parent)?;
                seq.serialize_element(child)?;
            }
            Self::SetAttribute {
                target,
                name,
                value,
            }
            | Self::SetProperty {
                target,
                name,
                value,
            } => {
                seq.serialize_element(target)?;
                seq.serialize_element(name)?;
                seq.serialize_element(value)?;
            }
            Self::CloneNode {
                target,
                clone_id,
                deep,
            } => {
                seq.serialize_element(target)?;
                seq.serialize_element(clone_id)?;
                seq.serialize_element(deep)?;
            }
            Self::InsertAdjacentElement {
                target,
                position,
                element,
            } => {
                seq.serialize_element(target)?;
                seq.serialize_element(position)?;
                seq.serialize_element(element)?;
            }
            Self::InsertAdjacentHtml {
                target,
                position,
                html: text,
            }
            | Self::InsertAdjacentText {
                target,
                position,
                text,
            } => {
                seq.serialize_element(target)?;
                seq.serialize_element(position)?;
                seq.serialize_element(text)?;
            }
            Self::PrependChild { parent, child } => {
                seq.serialize_element(parent)?;
                seq.serialize_element(child)?;
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Mutation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(MutationVisitor)
    }
}

struct MutationVisitor;

fn field<'de, T, A>(seq: &mut A, index: usize) -> Result<T, A::Error>
where
    T: Deserialize<'de>,
    A: SeqAccess<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(index, &"a complete mutation array"))
}

impl<'de> Visitor<'de> for MutationVisitor {
    type Value = Mutation;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a positional mutation array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Mutation, A::Error> {
        let tag: String = field(&mut seq, 0)?;
        let kind = MutationKind::from_tag(&tag)
            .ok_or_else(|| de::Error::custom(format!("unknown mutation tag: {}", tag)))?;

        let mutation = match kind {
            MutationKind::CreateElement => Mutation::CreateElement {
                tag_name: field(&mut seq, 1)?,
                id: field(&mut seq, 2)?,
                is: seq.next_element::<Option<String>>()?.flatten(),
            },
            MutationKind::CreateTextNode => Mutation::CreateTextNode {
                data: field(&mut seq, 1)?,
                id: field(&mut seq, 2)?,
            },
            MutationKind::CreateDocumentFragment => Mutation::CreateDocumentFragment {
                id: field(&mut seq, 1)?,
            },
            MutationKind::RemoveElement => Mutation::RemoveElement {
                target: field(&mut seq, 1)?,
            },
            MutationKind::AppendChild => Mutation::AppendChild {
                parent: field(&mut seq, 1)?,
                child: field(&mut seq, 2)?,
            },
            MutationKind::RemoveChild => Mutation::RemoveChild {
                parent: field(&mut seq, 1)?,
                child: field(&mut seq, 2)?,
            },
            MutationKind::SetAttribute => Mutation::SetAttribute {
                target: field(&mut seq, 1)?,
                name: field(&mut seq, 2)?,
                value: field(&mut seq, 3)?,
            },
            MutationKind::SetProperty => Mutation::SetProperty {
                target: field(&mut seq, 1)?,
                name: field(&mut seq, 2)?,
                value: field(&mut seq, 3)?,
            },
            MutationKind::CloneNode => Mutation::CloneNode {
                target: field(&mut seq, 1)?,
                clone_id: field(&mut seq, 2)?,
                deep: field(&mut seq, 3)?,
            },
            MutationKind::InsertAdjacentElement => Mutation::InsertAdjacentElement {
                target: field(&mut seq, 1)?,
                position: field(&mut seq, 2)?,
                element: field(&mut seq, 3)?,
            },
            MutationKind::InsertAdjacentHtml => Mutation::InsertAdjacentHtml {
                target: field(&mut seq, 1)?,
                position: field(&mut seq, 2)?,
                html: field(&mut seq, 3)?,
            },
            MutationKind::InsertAdjacentText => Mutation::InsertAdjacentText {
                target: field(&mut seq, 1)?,
                position: field(&mut seq, 2)?,
                text: field(&mut seq, 3)?,
            },
            MutationKind::PrependChild => Mutation::PrependChild {
                parent: field(&mut seq, 1)?,
                child: field(&mut seq, 2)?,
            },
            MutationKind::Normalize => Mutation::Normalize {
                target: field(&mut seq, 1)?,
            },
        };

        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(mutation)
    }
}

/// Ordered group of mutations sent as one wire message.
///
/// Decoding is lenient: entries with an unknown tag or a malformed layout are
/// logged and skipped, the rest of the batch is kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch(pub Vec<Mutation>);

impl MutationBatch {
    pub fn new(mutations: Vec<Mutation>) -> Self {
        Self(mutations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Mutation> {
        self.0
    }
}

impl From<Vec<Mutation>> for MutationBatch {
    fn from(mutations: Vec<Mutation>) -> Self {
        Self(mutations)
    }
}

impl IntoIterator for MutationBatch {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for MutationBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MutationBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let mut mutations = Vec::with_capacity(raw.len());
        for value in raw {
            match Mutation::decode(value) {
                Ok(mutation) => mutations.push(mutation),
                Err(e) => warn!("Skipping undecodable mutation: {}", e),
            }
        }
        Ok(Self(mutations))
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
