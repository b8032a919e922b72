//! Declarative element descriptions
//!
//! A [`Spec`] describes one element and its subtree. Specs are built in code
//! with the `with_*` methods or loaded from JSON:
//!
//! ```rust
//! use brick_builder::Spec;
//!
//! let spec: Spec = serde_json::from_str(r#"{
//!     "tag": "div",
//!     "classes": "copy",
//!     "children": [{ "tag": "p", "text": "Hello {{name}}" }]
//! }"#).unwrap();
//!
//! assert_eq!(spec.children.len(), 1);
//! ```

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::dom::Anchor;

/// Errors that can occur when loading specs from a file
#[derive(Error, Debug)]
pub enum SpecLoadError {
    #[error("Failed to read spec file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse spec JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One attribute to apply, in order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Gate deciding whether a spec renders at all
#[derive(Clone)]
pub enum Condition {
    Bool(bool),
    /// Evaluated once, at render time
    Predicate(Rc<dyn Fn() -> bool>),
}

impl Condition {
    pub fn predicate(f: impl Fn() -> bool + 'static) -> Self {
        Condition::Predicate(Rc::new(f))
    }

    pub fn evaluate(&self) -> bool {
        match self {
            Condition::Bool(value) => *value,
            Condition::Predicate(f) => f(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Bool(value)
    }
}

/// Accepts any scalar and reduces it to its truthiness
struct TruthyVisitor;

impl<'de> Visitor<'de> for TruthyVisitor {
    type Value = Condition;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number, string or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Condition, E> {
        Ok(Condition::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Condition, E> {
        Ok(Condition::Bool(v != 0))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Condition, E> {
        Ok(Condition::Bool(v != 0))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Condition, E> {
        Ok(Condition::Bool(v != 0.0 && !v.is_nan()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Condition, E> {
        Ok(Condition::Bool(!v.is_empty()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Condition, E> {
        Ok(Condition::Bool(false))
    }

    fn visit_none<E: de::Error>(self) -> Result<Condition, E> {
        Ok(Condition::Bool(false))
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TruthyVisitor)
    }
}

/// Description of one element and its subtree
#[derive(Debug, Clone, Deserialize)]
pub struct Spec {
    /// Element name; must be on the allow-list
    pub tag: String,
    /// Attributes applied in order before `classes`
    #[serde(default)]
    pub attrs: Vec<Attr>,
    /// Explicit anchor overriding the current root
    #[serde(default)]
    pub parent: Option<Anchor>,
    /// Nested specs, rendered in order
    #[serde(default)]
    pub children: Vec<Spec>,
    /// Literal text content
    #[serde(default)]
    pub text: Option<String>,
    /// Class string; always wins over a `class` entry in `attrs`
    #[serde(default)]
    pub classes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_condition")]
    pub condition: Option<Condition>,
}

// A present-but-null condition is a falsy gate, not a missing one
fn deserialize_condition<'de, D>(deserializer: D) -> Result<Option<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    Condition::deserialize(deserializer).map(Some)
}

impl Spec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            text: None,
            classes: None,
            condition: None,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    pub fn with_parent(mut self, parent: impl Into<Anchor>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_child(mut self, child: Spec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Spec>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Gate rendering on a predicate evaluated at render time
    pub fn when(self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.with_condition(Condition::predicate(predicate))
    }

    /// Whether this spec should render; specs without a condition always do
    pub fn should_render(&self) -> bool {
        self.condition.as_ref().map_or(true, Condition::evaluate)
    }
}

/// A spec file holds either one spec or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum SpecFile {
    Many(Vec<Spec>),
    One(Box<Spec>),
}

/// Parse specs from JSON text
pub fn specs_from_str(content: &str) -> Result<Vec<Spec>, SpecLoadError> {
    let parsed: SpecFile = serde_json::from_str(content)?;
    Ok(match parsed {
        SpecFile::Many(specs) => specs,
        SpecFile::One(spec) => vec![*spec],
    })
}

/// Load specs from a JSON file
pub fn specs_from_file(path: &Path) -> Result<Vec<Spec>, SpecLoadError> {
    let content = std::fs::read_to_string(path)?;
    specs_from_str(&content)
}
