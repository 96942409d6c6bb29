use serde::{Deserialize, Serialize};

/// JSON Feed version this service emits.
pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

/// Media type of a JSON Feed document.
pub const JSON_FEED_CONTENT_TYPE: &str = "application/feed+json";

/// Top-level JSON Feed object. Empty optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFeed {
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<FeedItem>,
}

impl JsonFeed {
    /// An empty feed with the current version.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: JSON_FEED_VERSION.to_string(),
            title: title.into(),
            home_page_url: None,
            description: None,
            items: Vec::new(),
        }
    }
}

/// A single feed entry. `id` is always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// RFC 3339, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
}
