//! HTML sanitization for item bodies.

use std::collections::{HashMap, HashSet};

/// Cleans untrusted HTML before it is published.
pub trait HtmlSanitizer: Send + Sync {
    fn clean(&self, html: &str) -> String;
}

/// Tags kept in item bodies.
const ALLOWED_TAGS: &[&str] = &[
    "a",
    "abbr",
    "acronym",
    "b",
    "blockquote",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "strong",
    "ul",
    "p",
    "img",
];

/// Elements removed together with their content.
const REMOVED_WITH_CONTENT: &[&str] = &["script", "style"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Attributes kept per tag. Everything else is dropped.
const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("abbr", &["title"]),
    ("acronym", &["title"]),
    ("img", &["src"]),
];

/// `ammonia` sanitizer limited to a fixed tag and attribute allow-list.
///
/// Disallowed tags are removed and their text kept; `script` and `style`
/// are removed with their content.
pub struct AllowListSanitizer {
    cleaner: ammonia::Builder<'static>,
}

impl AllowListSanitizer {
    pub fn new() -> Self {
        let tags: HashSet<&'static str> = ALLOWED_TAGS.iter().copied().collect();
        let attributes: HashMap<&'static str, HashSet<&'static str>> = ALLOWED_ATTRIBUTES
            .iter()
            .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
            .collect();

        let mut cleaner = ammonia::Builder::empty();
        cleaner
            .tags(tags)
            .clean_content_tags(REMOVED_WITH_CONTENT.iter().copied().collect())
            .tag_attributes(attributes)
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .link_rel(None);

        Self { cleaner }
    }
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSanitizer for AllowListSanitizer {
    fn clean(&self, html: &str) -> String {
        self.cleaner.clean(html).to_string()
    }
}
