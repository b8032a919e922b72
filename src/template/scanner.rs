//! Placeholder scanning and replacement

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// `{{` + key without braces + `}}`, leftmost and non-overlapping
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"));

/// Result of one substitution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub output: String,
    /// Placeholders replaced with a value
    pub replaced: usize,
    /// Placeholders left verbatim
    pub unresolved: usize,
}

impl Substitution {
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

/// Keys of all placeholders in `input`, in order of appearance
pub fn placeholders(input: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER_RE
        .captures_iter(input)
        .filter_map(|caps| caps.get(1))
        .map(|key| key.as_str())
}

/// Replace every placeholder whose key resolves
///
/// Keys are passed to `resolve` exactly as written between the braces
/// (case-sensitive, no trimming). Placeholders that do not resolve are
/// copied to the output unchanged.
pub fn substitute<'v>(
    input: &str,
    mut resolve: impl FnMut(&str) -> Option<Cow<'v, str>>,
) -> Substitution {
    let mut output = String::with_capacity(input.len());
    let mut replaced = 0;
    let mut unresolved = 0;
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(input) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        output.push_str(&input[last..whole.start()]);
        match resolve(key.as_str()) {
            Some(value) => {
                output.push_str(&value);
                replaced += 1;
            }
            None => {
                output.push_str(whole.as_str());
                unresolved += 1;
            }
        }
        last = whole.end();
    }
    output.push_str(&input[last..]);

    Substitution {
        output,
        replaced,
        unresolved,
    }
}
