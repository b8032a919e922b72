//! Markup tokenizer, tree parser and escaping helpers
//!
//! The parser accepts well-formed markup as produced by the serializer in
//! [`super::memory`], plus the loose forms found in hand-written host pages:
//! unquoted and bare attributes, self-closing syntax, comments and doctype
//! declarations. Implied end tags are not inferred; every non-void element
//! must be closed explicitly.

use std::borrow::Cow;

use logos::Logos;

use crate::error::{MarkupError, Span};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    #[regex(r#"<[A-Za-z][A-Za-z0-9\-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    #[regex(r"</[A-Za-z][A-Za-z0-9\-]*[ \t\r\n]*>")]
    EndTag,

    #[token("<!--", comment_end)]
    Comment,

    // Doctype and other declarations are dropped
    #[regex(r"<![A-Za-z][^>]*>")]
    Declaration,

    #[regex(r"[^<]+")]
    Text,

    #[token("<")]
    Lt,
}

/// Consume everything up to and including the closing `-->`
fn comment_end(lex: &mut logos::Lexer<Token>) -> bool {
    let remainder = lex.remainder();
    let len = match remainder.find("-->") {
        Some(end) => end + 3,
        None => remainder.len(),
    };
    lex.bump(len);
    true
}

/// A parsed markup node, detached from any document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
    Comment(String),
}

struct OpenElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<MarkupNode>,
    span: Span,
}

impl OpenElement {
    fn into_node(self) -> MarkupNode {
        MarkupNode::Element {
            name: self.name,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

/// Parse a markup fragment into a list of top-level nodes
pub fn parse(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut roots = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    for (token, span) in Token::lexer(input).spanned() {
        let slice = &input[span.clone()];
        let node = match token {
            Ok(Token::StartTag) => {
                let (name, attributes, self_closing) = parse_start_tag(slice);
                if self_closing || is_void_element(&name) {
                    MarkupNode::Element {
                        name,
                        attributes,
                        children: Vec::new(),
                    }
                } else {
                    stack.push(OpenElement {
                        name,
                        attributes,
                        children: Vec::new(),
                        span,
                    });
                    continue;
                }
            }
            Ok(Token::EndTag) => {
                let name = slice[2..slice.len() - 1].trim_end().to_ascii_lowercase();
                match stack.pop() {
                    Some(open) if open.name == name => open.into_node(),
                    Some(open) => {
                        return Err(MarkupError::UnexpectedEndTag {
                            name,
                            span,
                            open: Some(open.name),
                        })
                    }
                    None => {
                        return Err(MarkupError::UnexpectedEndTag {
                            name,
                            span,
                            open: None,
                        })
                    }
                }
            }
            Ok(Token::Comment) => {
                let body = &slice[4..];
                MarkupNode::Comment(body.strip_suffix("-->").unwrap_or(body).to_string())
            }
            Ok(Token::Declaration) => continue,
            Ok(Token::Text) => MarkupNode::Text(decode_entities(slice).into_owned()),
            // Anything that does not form a tag is literal text
            Ok(Token::Lt) | Err(()) => MarkupNode::Text(slice.to_string()),
        };
        push_node(&mut stack, &mut roots, node);
    }

    match stack.pop() {
        Some(open) => Err(MarkupError::UnclosedElement {
            name: open.name,
            span: open.span,
        }),
        None => Ok(roots),
    }
}

fn push_node(stack: &mut [OpenElement], roots: &mut Vec<MarkupNode>, node: MarkupNode) {
    let siblings = match stack.last_mut() {
        Some(open) => &mut open.children,
        None => roots,
    };
    // adjacent text runs form a single text node
    if let MarkupNode::Text(text) = &node {
        if let Some(MarkupNode::Text(prev)) = siblings.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    siblings.push(node);
}

/// Split a start tag into its lowercased name, attributes and self-closing flag
fn parse_start_tag(slice: &str) -> (String, Vec<(String, String)>, bool) {
    let inner = &slice[1..slice.len() - 1];
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };
    let name_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    (name, parse_attributes(&inner[name_end..]), self_closing)
}

fn parse_attributes(mut rest: &str) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }
        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        if name_end == 0 {
            // stray '='
            rest = &rest[1..];
            continue;
        }
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let (raw, remaining) = split_attribute_value(after_eq.trim_start());
                rest = remaining;
                decode_entities(raw).into_owned()
            }
            None => String::new(),
        };

        // first occurrence wins
        if !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }
    attributes
}

fn split_attribute_value(input: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(body) = input.strip_prefix(quote) {
            return match body.find(quote) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
        }
    }
    let end = input
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(input.len());
    (&input[..end], &input[end..])
}

/// Whether `name` can be written as a start and end tag this parser reads back
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Elements that never have children or an end tag
pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "isindex"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Decode named and numeric character references
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode one reference at the start of `input`, returning the char and the
/// number of bytes consumed
fn decode_entity(input: &str) -> Option<(char, usize)> {
    let semi = input.bytes().take(12).position(|b| b == b';')?;
    let body = &input[1..semi];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let digits = body.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}

fn escape_with(input: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !input.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match replacement(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape text content for serialization
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape_with(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escape a double-quoted attribute value for serialization
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

/// Escape a value so it reads as literal text in both text and attribute
/// positions
pub fn escape_value(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, attributes: &[(&str, &str)], children: Vec<MarkupNode>) -> MarkupNode {
        MarkupNode::Element {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    fn text(s: &str) -> MarkupNode {
        MarkupNode::Text(s.to_string())
    }

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse("<div><p>hi</p><p>there</p></div>").unwrap();
        assert_eq!(
            nodes,
            vec![element(
                "div",
                &[],
                vec![
                    element("p", &[], vec![text("hi")]),
                    element("p", &[], vec![text("there")]),
                ]
            )]
        );
    }

    #[test]
    fn test_parse_attribute_forms() {
        let nodes =
            parse(r#"<input type="text" value='a b' disabled name=q data-x="1 &amp; 2">"#).unwrap();
        assert_eq!(
            nodes,
            vec![element(
                "input",
                &[
                    ("type", "text"),
                    ("value", "a b"),
                    ("disabled", ""),
                    ("name", "q"),
                    ("data-x", "1 & 2"),
                ],
                vec![]
            )]
        );
    }

    #[test]
    fn test_parse_duplicate_attribute_keeps_first() {
        let nodes = parse(r#"<div class="a" class="b"></div>"#).unwrap();
        assert_eq!(nodes, vec![element("div", &[("class", "a")], vec![])]);
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let nodes = parse("<hr><br/><div/>text").unwrap();
        assert_eq!(
            nodes,
            vec![
                element("hr", &[], vec![]),
                element("br", &[], vec![]),
                element("div", &[], vec![]),
                text("text"),
            ]
        );
    }

    #[test]
    fn test_parse_lowercases_names() {
        let nodes = parse(r#"<DIV ID="x"></div>"#).unwrap();
        assert_eq!(nodes, vec![element("div", &[("id", "x")], vec![])]);
    }

    #[test]
    fn test_parse_decodes_text_entities() {
        let nodes = parse("<p>a &lt;b&gt; &amp; &#65;&#x42; &unknown; &</p>").unwrap();
        assert_eq!(
            nodes,
            vec![element("p", &[], vec![text("a <b> & AB &unknown; &")])]
        );
    }

    #[test]
    fn test_parse_keeps_comments_and_drops_doctype() {
        let nodes = parse("<!DOCTYPE html><!-- note > here --><p></p>").unwrap();
        assert_eq!(
            nodes,
            vec![
                MarkupNode::Comment(" note > here ".to_string()),
                element("p", &[], vec![]),
            ]
        );
    }

    #[test]
    fn test_parse_stray_lt_is_text() {
        let nodes = parse("<p>1 < 2</p>").unwrap();
        assert_eq!(nodes, vec![element("p", &[], vec![text("1 < 2")])]);
    }

    #[test]
    fn test_parse_placeholder_survives() {
        let nodes = parse(r#"<h1 title="{{t}}">{{page_title}}</h1>"#).unwrap();
        assert_eq!(
            nodes,
            vec![element("h1", &[("title", "{{t}}")], vec![text("{{page_title}}")])]
        );
    }

    #[test]
    fn test_parse_mismatched_end_tag() {
        let err = parse("<div><p>hi</div>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::UnexpectedEndTag {
                name: "div".to_string(),
                span: 10..16,
                open: Some("p".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_stray_end_tag() {
        let err = parse("hi</p>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnexpectedEndTag { open: None, .. }
        ));
    }

    #[test]
    fn test_parse_unclosed_element() {
        let err = parse("<ul><li>a</li>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::UnclosedElement {
                name: "ul".to_string(),
                span: 0..4,
            }
        );
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_text("a < b & c > d \""), "a &lt; b &amp; c &gt; d \"");
        assert_eq!(escape_attribute("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; <go>");
        assert_eq!(escape_value("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
        assert!(matches!(escape_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_tag_name_grammar() {
        for name in ["div", "h3", "my-widget", "X1"] {
            assert!(is_valid_tag_name(name), "{}", name);
        }
        for name in ["", "my_tag", "1up", "-x", "a b", "x:y"] {
            assert!(!is_valid_tag_name(name), "{}", name);
        }
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("img"));
        assert!(!is_void_element("div"));
        assert!(!is_void_element("p"));
    }
}
