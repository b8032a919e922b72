//! Error types for rendering, markup parsing and host document access

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::dom::NodeId;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Errors produced while parsing serialized markup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// An end tag that does not close the innermost open element
    #[error("unexpected end tag </{name}> at {span:?}")]
    UnexpectedEndTag {
        name: String,
        span: Span,
        /// Name of the element that was open at that point, if any
        open: Option<String>,
    },

    /// Input ended while an element was still open
    #[error("element <{name}> opened at {span:?} is never closed")]
    UnclosedElement { name: String, span: Span },
}

impl MarkupError {
    /// Byte range of the offending tag
    pub fn span(&self) -> Span {
        match self {
            MarkupError::UnexpectedEndTag { span, .. } => span.clone(),
            MarkupError::UnclosedElement { span, .. } => span.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span();
        let (message, note) = match self {
            MarkupError::UnexpectedEndTag { name, open, .. } => (
                format!("unexpected end tag </{}>", name),
                match open {
                    Some(open) => format!("expected </{}> here", open),
                    None => "no element is open at this point".to_string(),
                },
            ),
            MarkupError::UnclosedElement { name, .. } => (
                format!("element <{}> is never closed", name),
                "opened here".to_string(),
            ),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, span))
                    .with_message(note)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Errors reported by a host document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Attribute name that cannot be serialized
    #[error("invalid attribute name '{name}'")]
    InvalidAttributeName { name: String },

    /// Handle was not issued by this document
    #[error("node {0:?} does not belong to this document")]
    UnknownNode(NodeId),

    /// Text or comment node used where an element is required
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// Appending would make a node its own ancestor
    #[error("cannot append node {child:?} into its own subtree at {parent:?}")]
    CyclicAppend { parent: NodeId, child: NodeId },

    /// Markup written into the document did not parse
    #[error("markup error: {0}")]
    Markup(#[from] MarkupError),
}

/// Errors that abort a `create_elements` call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Tag name missing from the allow-list
    #[error(
        "\"{tag}\" is not a valid HTML element. https://html.spec.whatwg.org/multipage/syntax.html#special"
    )]
    InvalidTag { tag: String },

    /// The host document rejected an operation
    #[error("host document error: {0}")]
    Dom(#[from] DomError),
}

impl BuildError {
    pub fn invalid_tag(tag: impl Into<String>) -> Self {
        Self::InvalidTag { tag: tag.into() }
    }
}
