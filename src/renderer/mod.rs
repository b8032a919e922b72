//! Recursive spec-to-node rendering
//!
//! Takes a [`Spec`] and attaches the element it describes, with its whole
//! subtree, to a host document. Each element is fully configured (attributes,
//! classes, text, children in order) before it is attached to its anchor.

use tracing::{debug, warn};

use crate::dom::{HostDocument, NodeId};
use crate::error::BuildError;
use crate::spec::Spec;
use crate::tags::TagAllowlist;

/// Turns specs into attached nodes
#[derive(Debug, Clone, Default)]
pub struct SpecRenderer {
    tags: TagAllowlist,
}

impl SpecRenderer {
    pub fn new(tags: TagAllowlist) -> Self {
        Self { tags }
    }

    /// The allow-list every rendered tag is checked against
    pub fn tags(&self) -> &TagAllowlist {
        &self.tags
    }

    /// Render `spec` and attach it
    ///
    /// The anchor is `alternate_target` when given (used for children), else
    /// the spec's own `parent`, else `root`. Returns `Ok(None)` when the
    /// spec's condition is falsy; in that case nothing is created and no
    /// child is visited.
    ///
    /// An element whose tag is not allowed aborts the render. Nodes appended
    /// before the failing step stay where they are, but the failing branch
    /// never reaches its anchor because elements attach only after all their
    /// children rendered.
    pub fn render<D: HostDocument>(
        &self,
        document: &mut D,
        spec: &Spec,
        root: NodeId,
        alternate_target: Option<NodeId>,
    ) -> Result<Option<NodeId>, BuildError> {
        if !spec.should_render() {
            debug!(tag = %spec.tag, "condition is falsy, skipping subtree");
            return Ok(None);
        }

        let target = match alternate_target {
            Some(target) => target,
            None => self.resolve_parent(document, spec, root),
        };

        if !self.tags.contains(&spec.tag) {
            return Err(BuildError::invalid_tag(&spec.tag));
        }

        let element = document.create_element(&spec.tag);

        for attr in &spec.attrs {
            document.set_attribute(element, &attr.name, &attr.value)?;
        }

        if let Some(classes) = spec.classes.as_deref().filter(|c| !c.is_empty()) {
            document.set_class_name(element, classes)?;
        }

        if let Some(text) = spec.text.as_deref().filter(|t| !t.is_empty()) {
            document.set_text_content(element, text)?;
        }

        for child in &spec.children {
            self.render(document, child, root, Some(element))?;
        }

        document.append_child(target, element)?;
        Ok(Some(element))
    }

    fn resolve_parent<D: HostDocument>(&self, document: &D, spec: &Spec, root: NodeId) -> NodeId {
        let Some(anchor) = &spec.parent else {
            return root;
        };
        match document.resolve_anchor(anchor) {
            Some(node) => node,
            None => {
                warn!(
                    tag = %spec.tag,
                    parent = ?anchor,
                    "spec parent is not an element of the document, attaching to root"
                );
                root
            }
        }
    }
}
