//! Live text substitution over serialized markup
//!
//! Values registered in a [`DataRegistry`] replace `{{key}}` placeholders in
//! the root's markup. The [`TemplatingEngine`] keeps a snapshot of that markup
//! and, on each tick, rewrites the document only when a placeholder actually
//! resolved.
//!
//! # Example
//!
//! ```text
//! <h1>{{page_title}}</h1>        registry: page_title = "Builder"
//!                         tick
//! <h1>Builder</h1>
//! ```
//!
//! Unresolved placeholders are left verbatim so data can arrive later.

mod engine;
mod registry;
mod scanner;

pub use engine::{TemplatingEngine, TickOutcome};
pub use registry::DataRegistry;
pub use scanner::{placeholders, substitute, Substitution};
