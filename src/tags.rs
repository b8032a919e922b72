//! Allow-list of element tag names the renderer may create
//!
//! The default table is the WHATWG "special" element category
//! (<https://html.spec.whatwg.org/multipage/parsing.html#special>), kept as a
//! fixed lookup. Extra names can be appended through configuration.

use std::collections::HashSet;

use tracing::warn;

use crate::dom::markup::is_valid_tag_name;

/// Tag names permitted by default
const SPECIAL_TAGS: &[&str] = &[
    "address",
    "applet",
    "area",
    "article",
    "aside",
    "base",
    "basefont",
    "bgsound",
    "blockquote",
    "body",
    "br",
    "button",
    "caption",
    "center",
    "col",
    "colgroup",
    "dd",
    "details",
    "dir",
    "div",
    "dl",
    "dt",
    "embed",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "frame",
    "frameset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "head",
    "header",
    "hgroup",
    "hr",
    "html",
    "iframe",
    "img",
    "input",
    "isindex",
    "li",
    "link",
    "listing",
    "main",
    "marquee",
    "menu",
    "menuitem",
    "meta",
    "nav",
    "noembed",
    "noframes",
    "noscript",
    "object",
    "ol",
    "p",
    "param",
    "plaintext",
    "pre",
    "script",
    "section",
    "select",
    "source",
    "style",
    "summary",
    "table",
    "tbody",
    "td",
    "template",
    "textarea",
    "tfoot",
    "th",
    "thead",
    "title",
    "tr",
    "track",
    "ul",
    "wbr",
    "xmp",
];

/// A set of permitted element names
#[derive(Debug, Clone)]
pub struct TagAllowlist {
    tags: HashSet<String>,
}

impl TagAllowlist {
    /// An allow-list containing exactly the given names
    ///
    /// Names the markup parser cannot read back are skipped with a warning.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: HashSet::new(),
        }
        .with_extra(tags)
    }

    /// Add more permitted names to this allow-list
    pub fn with_extra<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if is_valid_tag_name(&tag) {
                self.tags.insert(tag);
            } else {
                warn!(tag = %tag, "ignoring tag name that is not valid markup");
            }
        }
        self
    }

    /// Membership test. Matching is exact and case-sensitive.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for TagAllowlist {
    fn default() -> Self {
        Self::from_tags(SPECIAL_TAGS.iter().copied())
    }
}
