//! Host document boundary
//!
//! The renderer and templating engine never touch a concrete document type.
//! They work through [`HostDocument`], which exposes only the capabilities
//! they need: creating elements, setting attributes and text, appending
//! children, reading and writing the serialized markup of a subtree, and
//! telling genuine element nodes apart from stale handles.
//!
//! [`MemoryDocument`] is the in-process implementation used by the CLI and
//! the test suite.

pub mod markup;
pub mod memory;

use serde::{Deserialize, Deserializer};

use crate::error::DomError;

pub use markup::MarkupNode;
pub use memory::MemoryDocument;

/// Opaque handle to a node owned by one document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a rendered node gets attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// A node handle obtained from the document
    Node(NodeId),
    /// A simple selector resolved against the document (`#id`, `.class`, `tag`)
    Selector(String),
}

impl From<NodeId> for Anchor {
    fn from(node: NodeId) -> Self {
        Anchor::Node(node)
    }
}

impl From<&str> for Anchor {
    fn from(selector: &str) -> Self {
        Anchor::Selector(selector.to_string())
    }
}

impl From<String> for Anchor {
    fn from(selector: String) -> Self {
        Anchor::Selector(selector)
    }
}

// In spec files an anchor can only be written as a selector
impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Anchor::Selector)
    }
}

/// The operations the builder needs from a document
pub trait HostDocument {
    /// The document-wide anchor used when no root has been set
    fn default_root(&self) -> NodeId;

    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Set one attribute, overwriting any previous value
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Replace the node's class string
    fn set_class_name(&mut self, node: NodeId, classes: &str) -> Result<(), DomError> {
        self.set_attribute(node, "class", classes)
    }

    /// Replace all children with a single literal text node
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Append `child` as the last child of `parent`, detaching it first
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Serialized markup of the node's children
    fn inner_markup(&self, node: NodeId) -> Result<String, DomError>;

    /// Parse `markup` and replace the node's children with the result
    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), DomError>;

    /// Whether `node` is a live element of this document
    fn is_element(&self, node: NodeId) -> bool;

    /// First element matching a simple selector, in document order
    fn query_selector(&self, selector: &str) -> Option<NodeId>;

    /// Resolve an anchor to a live element
    fn resolve_anchor(&self, anchor: &Anchor) -> Option<NodeId> {
        match anchor {
            Anchor::Node(node) => Some(*node).filter(|node| self.is_element(*node)),
            Anchor::Selector(selector) => self.query_selector(selector),
        }
    }
}
