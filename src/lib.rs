//! Brick Builder - declarative element trees with live templating
//!
//! Describe elements as nested data ([`Spec`]s), render them into a host
//! document, and bind `{{placeholders}}` in the rendered markup to values in a
//! registry.
//!
//! # Example
//!
//! ```rust
//! use brick_builder::{Builder, MemoryDocument, Spec};
//!
//! let mut builder = Builder::new(MemoryDocument::new());
//! builder
//!     .create_elements([
//!         Spec::new("h1").with_text("Hello {{name}}"),
//!         Spec::new("ul").with_children([
//!             Spec::new("li").with_text("one"),
//!             Spec::new("li").with_text("two"),
//!         ]),
//!     ])
//!     .unwrap();
//!
//! builder.register_data("name", "World");
//! builder.tick();
//!
//! assert_eq!(
//!     builder.document().markup(),
//!     "<h1>Hello World</h1><ul><li>one</li><li>two</li></ul>"
//! );
//! ```

pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod renderer;
pub mod spec;
pub mod tags;
pub mod template;

pub use builder::{Builder, Schedule};
pub use config::{BuilderConfig, ConfigError};
pub use dom::{Anchor, HostDocument, MemoryDocument, NodeId};
pub use error::{BuildError, DomError, MarkupError};
pub use renderer::SpecRenderer;
pub use spec::{specs_from_file, specs_from_str, Attr, Condition, Spec, SpecLoadError};
pub use tags::TagAllowlist;
pub use template::{DataRegistry, TemplatingEngine, TickOutcome};

use thiserror::Error;

/// Render specs into a fresh document and run one templating pass
///
/// Convenience for one-shot rendering: builds a [`MemoryDocument`] from
/// `page`, applies `config`, renders `specs` under the configured root and
/// returns the resulting body markup.
///
/// # Example
///
/// ```rust
/// use brick_builder::{render_page, BuilderConfig, Spec};
///
/// let config = BuilderConfig::new()
///     .with_root("#app")
///     .with_data("title", "Docs");
/// let html = render_page(
///     r#"<div id="app"></div>"#,
///     &[Spec::new("h2").with_text("{{title}}")],
///     config,
/// )
/// .unwrap();
///
/// assert_eq!(html, r#"<div id="app"><h2>Docs</h2></div>"#);
/// ```
pub fn render_page(page: &str, specs: &[Spec], config: BuilderConfig) -> Result<String, RenderError> {
    let document = MemoryDocument::from_markup(page)?;
    let mut builder = Builder::with_config(document, config);
    builder.create_elements(specs)?;
    builder.tick();
    Ok(builder.document().markup())
}

/// Errors that can occur during one-shot rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// The host page could not be parsed
    #[error("page markup error: {0}")]
    Markup(#[from] MarkupError),

    /// A spec could not be rendered
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}
