//! Snapshot-based templating pass

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::dom::markup::escape_value;
use crate::dom::{HostDocument, NodeId};
use crate::error::DomError;

use super::registry::DataRegistry;
use super::scanner::substitute;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Neither the snapshot nor the registry changed since the last scan
    Skipped,
    /// Scanned, but no placeholder resolved
    Unchanged,
    /// The document was rewritten
    Patched { replaced: usize },
    /// Substitutions were found but the document rejected the new markup
    Failed,
}

/// Holds the last-known markup of the root and patches it from a registry
#[derive(Debug, Clone)]
pub struct TemplatingEngine {
    snapshot: String,
    escape_values: bool,
    /// Registry revision seen by the last scan; `None` forces a scan
    scanned_revision: Option<u64>,
}

impl TemplatingEngine {
    pub fn new(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: snapshot.into(),
            escape_values: true,
            scanned_revision: None,
        }
    }

    /// Whether registry values are escaped so they always read as text
    pub fn with_escape_values(mut self, escape: bool) -> Self {
        self.escape_values = escape;
        self
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Replace the snapshot wholesale; the next tick always scans
    pub fn set_snapshot(&mut self, snapshot: impl Into<String>) {
        self.snapshot = snapshot.into();
        self.scanned_revision = None;
    }

    /// Re-read the snapshot from the document
    pub fn refresh<D: HostDocument>(&mut self, document: &D, root: NodeId) -> Result<(), DomError> {
        let markup = document.inner_markup(root)?;
        self.set_snapshot(markup);
        Ok(())
    }

    /// Run one scan-and-patch pass
    pub fn tick<D: HostDocument>(
        &mut self,
        document: &mut D,
        root: NodeId,
        registry: &DataRegistry,
    ) -> TickOutcome {
        if self.scanned_revision == Some(registry.revision()) {
            return TickOutcome::Skipped;
        }
        self.scanned_revision = Some(registry.revision());

        let escape = self.escape_values;
        let result = substitute(&self.snapshot, |key| {
            registry.get(key).map(|value| {
                if escape {
                    escape_value(value)
                } else {
                    Cow::Borrowed(value)
                }
            })
        });

        if !result.changed() {
            debug!(unresolved = result.unresolved, "templating tick found nothing to substitute");
            return TickOutcome::Unchanged;
        }

        match document.set_inner_markup(root, &result.output) {
            Ok(()) => {
                debug!(
                    replaced = result.replaced,
                    unresolved = result.unresolved,
                    "templating tick patched document"
                );
                self.snapshot = result.output;
                TickOutcome::Patched {
                    replaced: result.replaced,
                }
            }
            Err(err) => {
                warn!(error = %err, "templating tick could not write patched markup");
                TickOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn setup(markup: &str) -> (MemoryDocument, NodeId, TemplatingEngine) {
        let doc = MemoryDocument::from_markup(markup).unwrap();
        let root = doc.body();
        let engine = TemplatingEngine::new(doc.markup());
        (doc, root, engine)
    }

    #[test]
    fn test_tick_patches_document_and_snapshot() {
        let (mut doc, root, mut engine) = setup("<div>Hello {{name}}</div>");
        let mut registry = DataRegistry::new();
        registry.set("name", "World");

        let outcome = engine.tick(&mut doc, root, &registry);
        assert_eq!(outcome, TickOutcome::Patched { replaced: 1 });
        assert_eq!(doc.markup(), "<div>Hello World</div>");
        assert_eq!(engine.snapshot(), "<div>Hello World</div>");
    }

    #[test]
    fn test_tick_without_matches_leaves_document() {
        let (mut doc, root, mut engine) = setup("<div>Hello {{name}}</div>");
        let registry = DataRegistry::new();
        let before = doc.children(root)[0];

        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Unchanged);
        // the original node is still attached, nothing was rewritten
        assert_eq!(doc.children(root), &[before]);
        assert_eq!(doc.markup(), "<div>Hello {{name}}</div>");
    }

    #[test]
    fn test_repeated_tick_is_skipped() {
        let (mut doc, root, mut engine) = setup("<p>{{a}}</p>");
        let mut registry = DataRegistry::new();
        registry.set("a", "1");
        assert!(matches!(
            engine.tick(&mut doc, root, &registry),
            TickOutcome::Patched { .. }
        ));
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Skipped);
        assert_eq!(doc.markup(), "<p>1</p>");
    }

    #[test]
    fn test_late_registration_resolves() {
        let (mut doc, root, mut engine) = setup("<p>{{late}}</p>");
        let mut registry = DataRegistry::new();
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Unchanged);
        registry.set("late", "here");
        assert_eq!(
            engine.tick(&mut doc, root, &registry),
            TickOutcome::Patched { replaced: 1 }
        );
        assert_eq!(doc.markup(), "<p>here</p>");
    }

    #[test]
    fn test_values_are_escaped() {
        let (mut doc, root, mut engine) = setup(r#"<p title="{{v}}">{{v}}</p>"#);
        let mut registry = DataRegistry::new();
        registry.set("v", "<b>\"bold\"</b>");
        engine.tick(&mut doc, root, &registry);

        let p = doc.elements_by_tag("p")[0];
        assert!(doc.elements_by_tag("b").is_empty());
        assert_eq!(doc.text_content(p), "<b>\"bold\"</b>");
        assert_eq!(doc.attribute(p, "title"), Some("<b>\"bold\"</b>"));
    }

    #[test]
    fn test_unescaped_values_become_markup() {
        let (mut doc, root, engine) = setup("<p>{{v}}</p>");
        let mut engine = engine.with_escape_values(false);
        let mut registry = DataRegistry::new();
        registry.set("v", "<b>bold</b>");
        engine.tick(&mut doc, root, &registry);
        assert_eq!(doc.elements_by_tag("b").len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_snapshot() {
        let (mut doc, root, engine) = setup("<p>{{v}}</p>");
        let mut engine = engine.with_escape_values(false);
        let mut registry = DataRegistry::new();
        registry.set("v", "<div>");
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Failed);
        assert_eq!(engine.snapshot(), "<p>{{v}}</p>");
        assert_eq!(doc.markup(), "<p>{{v}}</p>");
    }

    #[test]
    fn test_deleted_key_does_not_revert() {
        let (mut doc, root, mut engine) = setup("<p>{{name}}</p>");
        let mut registry = DataRegistry::new();
        registry.set("name", "World");
        engine.tick(&mut doc, root, &registry);
        registry.delete("name");
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Unchanged);
        assert_eq!(doc.markup(), "<p>World</p>");
    }

    #[test]
    fn test_refresh_forces_scan() {
        let (mut doc, root, mut engine) = setup("");
        let registry = DataRegistry::new();
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Unchanged);
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Skipped);
        engine.refresh(&doc, root).unwrap();
        assert_eq!(engine.tick(&mut doc, root, &registry), TickOutcome::Unchanged);
    }
}
