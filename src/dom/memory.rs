//! Arena-backed in-memory host document

use crate::error::{DomError, MarkupError};

use super::markup::{self, escape_attribute, escape_text, is_void_element, MarkupNode};
use super::{HostDocument, NodeId};

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeRecord {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document held entirely in memory
///
/// Nodes live in an arena and are never freed, so every [`NodeId`] handed out
/// stays valid (possibly detached) for the lifetime of the document. The
/// document has a single `body` element that serves as the default root.
///
/// Because slots are never reused, memory grows with every write: each
/// patching templating pass re-parses the root's subtree into fresh nodes, and
/// an aborted render leaves its detached nodes behind. [`node_count`] reports
/// the arena size. For long-lived use, rebuild the document from
/// [`MemoryDocument::markup`] when it grows too large; handles into the old
/// document must not be used with the new one.
///
/// [`node_count`]: MemoryDocument::node_count
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeRecord>,
    body: NodeId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document with an empty body
    pub fn new() -> Self {
        let body = NodeRecord {
            data: NodeData::Element {
                name: "body".to_string(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
        }
    }

    /// Create a document whose body holds the parsed markup
    pub fn from_markup(markup: &str) -> Result<Self, MarkupError> {
        let mut doc = Self::new();
        for tree in markup::parse(markup)? {
            let node = doc.insert_tree(tree);
            doc.attach(doc.body, node);
        }
        Ok(doc)
    }

    /// The document body
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Serialized markup of the body's children
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_children(self.body, &mut out);
        out
    }

    /// Serialized markup of the node itself, including its own tags
    pub fn outer_markup(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.index())?;
        let mut out = String::new();
        self.write_node(node, &mut out);
        Some(out)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index())?.parent
    }

    /// Concatenated text of the node and all its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Number of nodes in the arena, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All elements with the given tag name under the body, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(self.body, &mut |node| {
            if self.tag_name(node) == Some(tag) {
                found.push(node);
            }
            false
        });
        found
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn record(&self, node: NodeId) -> Result<&NodeRecord, DomError> {
        self.nodes
            .get(node.index())
            .ok_or(DomError::UnknownNode(node))
    }

    fn element_record(&self, node: NodeId) -> Result<&NodeRecord, DomError> {
        let record = self.record(node)?;
        match record.data {
            NodeData::Element { .. } => Ok(record),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    fn insert_tree(&mut self, tree: MarkupNode) -> NodeId {
        match tree {
            MarkupNode::Text(text) => self.alloc(NodeData::Text(text)),
            MarkupNode::Comment(text) => self.alloc(NodeData::Comment(text)),
            MarkupNode::Element {
                name,
                attributes,
                children,
            } => {
                let node = self.alloc(NodeData::Element { name, attributes });
                for child in children {
                    let child = self.insert_tree(child);
                    self.attach(node, child);
                }
                node
            }
        }
    }

    /// Link `child` under `parent`; both must exist and `child` must be detached
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()]
                .children
                .retain(|child| *child != node);
        }
    }

    fn detach_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        for child in children {
            self.nodes[child.index()].parent = None;
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node.index()].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Pre-order walk from `node`; the visitor returns `true` to stop early
    fn walk(&self, node: NodeId, visit: &mut dyn FnMut(NodeId) -> bool) -> bool {
        if visit(node) {
            return true;
        }
        for child in &self.nodes[node.index()].children {
            if self.walk(*child, visit) {
                return true;
            }
        }
        false
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(record) = self.nodes.get(node.index()) else {
            return;
        };
        match &record.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            NodeData::Element { .. } => {
                for child in &record.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn matches_selector(&self, node: NodeId, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            self.attribute(node, "id") == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.attribute(node, "class")
                .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
        } else {
            self.tag_name(node)
                .is_some_and(|name| name.eq_ignore_ascii_case(selector))
        }
    }

    fn write_children(&self, node: NodeId, out: &mut String) {
        for child in &self.nodes[node.index()].children {
            self.write_node(*child, out);
        }
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.index()].data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for (attr, value) in attributes {
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(name) {
                    return;
                }
                self.write_children(node, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

/// Attribute names that would not survive a serialize/parse round trip
fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '<' | '/' | '=')
        })
}

impl HostDocument for MemoryDocument {
    fn default_root(&self) -> NodeId {
        self.body
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            name: tag.to_string(),
            attributes: Vec::new(),
        })
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidAttributeName {
                name: name.to_string(),
            });
        }
        self.element_record(node)?;
        let NodeData::Element { attributes, .. } = &mut self.nodes[node.index()].data else {
            return Err(DomError::NotAnElement(node));
        };
        let name = name.to_ascii_lowercase();
        match attributes.iter_mut().find(|(attr, _)| *attr == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name, value.to_string())),
        }
        Ok(())
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.nodes.get_mut(node.index()).ok_or(DomError::UnknownNode(node))?.data {
            NodeData::Text(existing) | NodeData::Comment(existing) => {
                *existing = text.to_string();
                return Ok(());
            }
            NodeData::Element { .. } => {}
        }
        self.detach_children(node);
        if !text.is_empty() {
            let text_node = self.alloc(NodeData::Text(text.to_string()));
            self.attach(node, text_node);
        }
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element_record(parent)?;
        self.record(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::CyclicAppend { parent, child });
        }
        self.detach(child);
        self.attach(parent, child);
        Ok(())
    }

    fn inner_markup(&self, node: NodeId) -> Result<String, DomError> {
        self.element_record(node)?;
        let mut out = String::new();
        self.write_children(node, &mut out);
        Ok(out)
    }

    fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.element_record(node)?;
        let trees = markup::parse(markup)?;
        self.detach_children(node);
        for tree in trees {
            let child = self.insert_tree(tree);
            self.attach(node, child);
        }
        Ok(())
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.element_record(node).is_ok()
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() || selector == "#" || selector == "." {
            return None;
        }
        let mut found = None;
        self.walk(self.body, &mut |node| {
            if self.matches_selector(node, selector) {
                found = Some(node);
                return true;
            }
            false
        });
        found
    }
}
