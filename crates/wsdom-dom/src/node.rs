//! Node storage types.

use std::collections::BTreeMap;
use std::fmt;

use crate::property::PropertyValue;

/// Handle to a node inside one [`Document`](crate::Document) arena.
///
/// Slots are reused once their node is released; the generation makes a
/// handle to a released node resolve to nothing instead of to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn from_index(index: usize) -> Self {
        Self::new(index, 0)
    }

    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}.{}", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Mutable form-control state that is not reflected in attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Value set by script or user edits; `None` means "use the default value".
    pub dirty_value: Option<String>,
    /// Checkedness for checkboxes/radios, selectedness for options.
    pub checked: Option<bool>,
    /// Selection as character offsets.
    pub selection: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase local name.
    pub name: String,
    /// Customized built-in name given at creation.
    pub is: Option<String>,
    pub attrs: Vec<Attribute>,
    pub form: FormState,
    /// Expando properties assigned by script.
    pub props: BTreeMap<String, PropertyValue>,
}

impl ElementData {
    pub fn new(name: &str, is: Option<&str>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            is: is.map(str::to_string),
            attrs: Vec::new(),
            form: FormState::default(),
            props: BTreeMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Doctype { name: String },
    Element(ElementData),
    Text(String),
    Comment(String),
    Fragment,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }
}
