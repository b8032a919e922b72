//! The coordinating builder
//!
//! [`Builder`] owns the host document, the current root anchor, the data
//! registry and the templating schedule. Rendering always suspends the
//! schedule, refreshes the templating snapshot from the updated document and
//! re-arms, so a tick can never patch a snapshot that is mid-rewrite.
//!
//! The builder is constructed explicitly by whoever wires the process and is
//! meant to exist once per document.

mod schedule;

pub use schedule::Schedule;

use std::borrow::Borrow;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::BuilderConfig;
use crate::dom::{Anchor, HostDocument, NodeId};
use crate::error::BuildError;
use crate::renderer::SpecRenderer;
use crate::spec::Spec;
use crate::template::{DataRegistry, TemplatingEngine, TickOutcome};

/// Single entry point for rendering specs and registering template data
#[derive(Debug)]
pub struct Builder<D: HostDocument> {
    document: D,
    root: NodeId,
    registry: DataRegistry,
    renderer: SpecRenderer,
    engine: TemplatingEngine,
    schedule: Schedule,
}

impl<D: HostDocument> Builder<D> {
    /// Create a builder with default configuration, rooted at the document's
    /// default anchor
    pub fn new(document: D) -> Self {
        Self::with_config(document, BuilderConfig::default())
    }

    /// Create a builder from a configuration
    ///
    /// Seeds the registry from `config.data`, captures the initial snapshot,
    /// runs one templating pass and arms the schedule. A `config.root`
    /// selector that does not resolve leaves the default root in place.
    pub fn with_config(document: D, config: BuilderConfig) -> Self {
        let root = document.default_root();
        let mut builder = Self {
            renderer: SpecRenderer::new(config.tag_allowlist()),
            engine: TemplatingEngine::new(String::new())
                .with_escape_values(config.escape_values),
            registry: config.data.into_iter().collect(),
            schedule: Schedule::new(config.interval),
            document,
            root,
        };
        let rooted = match config.root {
            Some(selector) => builder.set_root(selector),
            None => false,
        };
        if !rooted {
            builder.resync();
        }
        builder
    }

    /// Make `anchor` the root for future top-level renders
    ///
    /// Content already rendered is not moved. If `anchor` is not an element of
    /// this document the root stays unchanged, a warning is logged and `false`
    /// is returned.
    pub fn set_root(&mut self, anchor: impl Into<Anchor>) -> bool {
        let anchor = anchor.into();
        match self.document.resolve_anchor(&anchor) {
            Some(node) => {
                self.schedule.cancel();
                self.root = node;
                self.resync();
                true
            }
            None => {
                warn!(root = ?anchor, "provided root is not a valid element, keeping current root");
                false
            }
        }
    }

    /// Render specs in order under the current root
    ///
    /// Accepts any sequence of specs, owned or borrowed: a `Vec`, a slice, an
    /// array or a single-item iterator are all the same call. Returns one
    /// entry per spec, `None` where a condition suppressed rendering.
    ///
    /// The first invalid spec aborts the call; specs before it stay rendered.
    /// Either way the templating snapshot is refreshed, one templating pass
    /// runs so already-registered data shows up immediately, and the schedule
    /// is re-armed.
    pub fn create_elements<I>(&mut self, specs: I) -> Result<Vec<Option<NodeId>>, BuildError>
    where
        I: IntoIterator,
        I::Item: Borrow<Spec>,
    {
        self.schedule.cancel();

        let mut created = Vec::new();
        let mut failure = None;
        for spec in specs {
            match self
                .renderer
                .render(&mut self.document, spec.borrow(), self.root, None)
            {
                Ok(node) => created.push(node),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        self.resync();
        debug!(rendered = created.len(), "create_elements finished");

        match failure {
            Some(err) => Err(err),
            None => Ok(created),
        }
    }

    /// Render a single spec; see [`Builder::create_elements`]
    pub fn create_element(&mut self, spec: &Spec) -> Result<Option<NodeId>, BuildError> {
        let created = self.create_elements(std::iter::once(spec))?;
        Ok(created.into_iter().next().flatten())
    }

    /// Register or overwrite a template value
    pub fn register_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.registry.set(key, value);
    }

    /// Remove a template value. Markup already patched is not reverted.
    pub fn delete_data(&mut self, key: &str) {
        self.registry.delete(key);
    }

    /// Fire the templating tick if its deadline has passed
    ///
    /// Returns `None` when no tick was due.
    pub fn poll(&mut self, now: Instant) -> Option<TickOutcome> {
        if !self.schedule.due(now) {
            return None;
        }
        let outcome = self
            .engine
            .tick(&mut self.document, self.root, &self.registry);
        self.schedule.arm(now);
        Some(outcome)
    }

    /// Run one templating pass immediately
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self
            .engine
            .tick(&mut self.document, self.root, &self.registry);
        if self.schedule.is_armed() {
            self.schedule.arm(Instant::now());
        }
        outcome
    }

    /// The host document
    pub fn document(&self) -> &D {
        &self.document
    }

    /// The current root anchor
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Registered template values
    pub fn registry(&self) -> &DataRegistry {
        &self.registry
    }

    /// The templating engine's current copy of the root's markup
    pub fn snapshot(&self) -> &str {
        self.engine.snapshot()
    }

    /// The templating timer; its deadline tells the host loop when to poll
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_armed(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Stop the schedule and hand the document back
    pub fn into_document(mut self) -> D {
        self.schedule.cancel();
        self.document
    }

    /// Refresh the snapshot from the root, patch it once and start a fresh
    /// period
    fn resync(&mut self) {
        match self.engine.refresh(&self.document, self.root) {
            Ok(()) => {
                let outcome = self
                    .engine
                    .tick(&mut self.document, self.root, &self.registry);
                debug!(?outcome, "templating pass after resync");
            }
            Err(err) => {
                warn!(error = %err, "could not read root markup, keeping previous snapshot");
            }
        }
        self.schedule.arm(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use std::time::Duration;

    fn builder() -> Builder<MemoryDocument> {
        Builder::new(MemoryDocument::new())
    }

    #[test]
    fn test_new_is_armed_with_initial_snapshot() {
        let builder = Builder::new(MemoryDocument::from_markup("<h1>{{app_name}}</h1>").unwrap());
        assert!(builder.is_armed());
        assert_eq!(builder.snapshot(), "<h1>{{app_name}}</h1>");
        assert_eq!(builder.root(), builder.document().body());
    }

    #[test]
    fn test_create_elements_returns_nodes_in_order() {
        let mut builder = builder();
        let created = builder
            .create_elements(vec![
                Spec::new("h2").with_text("a"),
                Spec::new("p").with_condition(false),
                Spec::new("hr"),
            ])
            .unwrap();
        assert_eq!(created.len(), 3);
        assert!(created[0].is_some());
        assert!(created[1].is_none());
        assert!(created[2].is_some());
        assert_eq!(builder.snapshot(), "<h2>a</h2><hr>");
        assert!(builder.is_armed());
    }

    #[test]
    fn test_call_shapes_are_equivalent() {
        let specs = [Spec::new("hr"), Spec::new("br")];

        let mut from_slice = builder();
        from_slice.create_elements(&specs).unwrap();

        let mut one_by_one = builder();
        for spec in &specs {
            one_by_one.create_element(spec).unwrap();
        }

        assert_eq!(from_slice.snapshot(), one_by_one.snapshot());
        assert_eq!(from_slice.snapshot(), "<hr><br>");
    }

    #[test]
    fn test_failed_create_still_rearms_and_refreshes() {
        let mut builder = builder();
        let err = builder
            .create_elements([Spec::new("hr"), Spec::new("spanner"), Spec::new("br")])
            .unwrap_err();
        assert_eq!(err, BuildError::invalid_tag("spanner"));
        assert!(builder.is_armed());
        // specs before the failing one stay rendered
        assert_eq!(builder.snapshot(), "<hr>");
    }

    #[test]
    fn test_set_root_valid_and_invalid() {
        let doc = MemoryDocument::from_markup(r#"<header></header><div id="app"></div>"#).unwrap();
        let mut builder = Builder::new(doc);
        let body = builder.root();

        assert!(!builder.set_root("#nope"));
        assert_eq!(builder.root(), body);

        assert!(builder.set_root("#app"));
        assert_ne!(builder.root(), body);
        builder.create_element(&Spec::new("p").with_text("in app")).unwrap();
        assert_eq!(
            builder.document().markup(),
            r#"<header></header><div id="app"><p>in app</p></div>"#
        );
        assert_eq!(builder.snapshot(), "<p>in app</p>");
    }

    #[test]
    fn test_set_root_refreshes_snapshot() {
        let doc = MemoryDocument::from_markup(r#"<p>{{x}}</p><div id="app">inner</div>"#).unwrap();
        let mut builder = Builder::new(doc);
        assert!(builder.set_root("#app"));
        assert_eq!(builder.snapshot(), "inner");

        builder.register_data("x", "1");
        builder.tick();
        // the placeholder outside the new root is not touched
        assert_eq!(
            builder.document().markup(),
            r#"<p>{{x}}</p><div id="app">inner</div>"#
        );
    }

    #[test]
    fn test_poll_respects_interval() {
        let config = BuilderConfig::new().with_interval(Duration::from_millis(100));
        let mut builder = Builder::with_config(MemoryDocument::new(), config);
        builder
            .create_element(&Spec::new("div").with_text("Hello {{name}}"))
            .unwrap();
        builder.register_data("name", "World");

        let deadline = builder.schedule().deadline().unwrap();
        assert_eq!(builder.poll(deadline - Duration::from_millis(1)), None);
        assert_eq!(
            builder.poll(deadline),
            Some(TickOutcome::Patched { replaced: 1 })
        );
        assert_eq!(builder.document().markup(), "<div>Hello World</div>");

        // re-armed from the tick instant, no backlog
        let next = builder.schedule().deadline().unwrap();
        assert_eq!(next, deadline + Duration::from_millis(100));
        assert_eq!(builder.poll(next), Some(TickOutcome::Skipped));
    }

    #[test]
    fn test_config_seeds_data_and_root() {
        let doc = MemoryDocument::from_markup(r#"<main id="app"><h1>{{app_name}}</h1></main>"#)
            .unwrap();
        let config = BuilderConfig::new()
            .with_root("#app")
            .with_data("app_name", "Builder");
        let builder = Builder::with_config(doc, config);
        assert_eq!(builder.registry().get("app_name"), Some("Builder"));
        // seeded data is substituted during construction
        assert_eq!(builder.snapshot(), "<h1>Builder</h1>");
        assert_eq!(
            builder.document().markup(),
            r#"<main id="app"><h1>Builder</h1></main>"#
        );
    }

    #[test]
    fn test_config_unresolved_root_still_arms() {
        let doc = MemoryDocument::from_markup("<h1>{{a}}</h1>").unwrap();
        let config = BuilderConfig::new().with_root("#missing").with_data("a", "X");
        let mut builder = Builder::with_config(doc, config);

        assert_eq!(builder.root(), builder.document().body());
        assert!(builder.is_armed());
        assert_eq!(builder.snapshot(), "<h1>X</h1>");
        assert_eq!(builder.document().markup(), "<h1>X</h1>");

        let deadline = builder.schedule().deadline().unwrap();
        assert_eq!(builder.poll(deadline), Some(TickOutcome::Skipped));
    }

    #[test]
    fn test_registered_data_applies_right_after_create() {
        let mut builder = builder();
        builder.register_data("name", "World");
        builder
            .create_element(&Spec::new("div").with_text("Hello {{name}}"))
            .unwrap();
        assert_eq!(builder.document().markup(), "<div>Hello World</div>");
        assert_eq!(builder.snapshot(), "<div>Hello World</div>");
        assert_eq!(builder.tick(), TickOutcome::Skipped);
    }

    #[test]
    fn test_failed_create_still_applies_registered_data() {
        let mut builder = builder();
        builder.register_data("n", "1");
        assert!(builder
            .create_elements([Spec::new("p").with_text("{{n}}"), Spec::new("spanner")])
            .is_err());
        assert_eq!(builder.document().markup(), "<p>1</p>");
    }

    #[test]
    fn test_config_extra_tags() {
        let config = BuilderConfig::new().with_extra_tag("span");
        let mut builder = Builder::with_config(MemoryDocument::new(), config);
        assert!(builder.create_element(&Spec::new("span")).is_ok());
    }

    #[test]
    fn test_unparseable_extra_tag_cannot_break_templating() {
        let config = BuilderConfig::new().with_extra_tag("my_tag");
        let mut builder = Builder::with_config(MemoryDocument::new(), config);
        assert_eq!(
            builder.create_element(&Spec::new("my_tag").with_text("{{x}}")),
            Err(BuildError::invalid_tag("my_tag"))
        );

        builder
            .create_element(&Spec::new("p").with_text("{{x}}"))
            .unwrap();
        builder.register_data("x", "1");
        assert_eq!(builder.tick(), TickOutcome::Patched { replaced: 1 });
        assert_eq!(builder.document().markup(), "<p>1</p>");
    }

    #[test]
    fn test_into_document_cancels() {
        let mut builder = builder();
        builder.create_element(&Spec::new("hr")).unwrap();
        let doc = builder.into_document();
        assert_eq!(doc.markup(), "<hr>");
    }
}
