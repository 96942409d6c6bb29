//! Catalog response to JSON Feed conversion.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use tracing::warn;

use crate::config::{FeedConfig, UpstreamConfig};
use crate::query::SearchQuery;
use crate::searcher::{CatalogResponse, CatalogTile};

use super::{FeedItem, HtmlSanitizer, JsonFeed};

/// Builds feeds for validated queries.
pub struct FeedAssembler {
    base_url: String,
    browse_endpoint: String,
    /// Shown in feed titles, e.g. `secure.royalcaribbean.com`.
    site: String,
    item_limit: usize,
    sanitizer: Arc<dyn HtmlSanitizer>,
}

impl FeedAssembler {
    pub fn new(
        upstream: &UpstreamConfig,
        feed: &FeedConfig,
        sanitizer: Arc<dyn HtmlSanitizer>,
    ) -> Self {
        Self {
            base_url: upstream.base_url.clone(),
            browse_endpoint: upstream.browse_endpoint.clone(),
            site: site_name(&upstream.base_url),
            item_limit: feed.item_limit,
            sanitizer,
        }
    }

    /// Build the feed for `query` from an upstream response.
    ///
    /// Items keep upstream order and stop at the item limit. Products
    /// without an id are skipped.
    pub fn assemble(&self, query: &SearchQuery, response: &CatalogResponse) -> JsonFeed {
        let category_url = format!(
            "{}{}{}",
            self.base_url, self.browse_endpoint, query.category.upstream_id
        );

        let mut feed = JsonFeed::new(format!("{} - {}", self.site, query.category.code));
        feed.home_page_url = Some(category_url.clone());
        feed.description = Some(query.category.display_name.to_string());

        feed.items = response
            .tiles()
            .iter()
            .take(self.item_limit)
            .filter_map(|tile| self.item(&category_url, tile, query))
            .collect();

        feed
    }

    fn item(&self, category_url: &str, tile: &CatalogTile, query: &SearchQuery) -> Option<FeedItem> {
        let Some(id) = tile.id.as_deref().filter(|id| !id.is_empty()) else {
            warn!(query = %query.raw_query, title = ?tile.title, "Skipping product without an id");
            return None;
        };

        let url = format!("{}/product/{}", category_url, id);
        let name = tile.title.as_deref().unwrap_or_default();
        let title = match tile.price_label() {
            Some(price) => format!("[{}] {}", price, name),
            None => name.to_string(),
        };

        let image = tile.thumbnail().map(strip_query);
        let mut body = String::new();
        if let Some(src) = &image {
            body.push_str(&format!("<img src=\"{}\">", src));
        }
        body.push_str(&format!(
            "<p>{}</p>",
            tile.description.as_deref().unwrap_or_default()
        ));

        Some(FeedItem {
            id: url.clone(),
            url: Some(url),
            title: Some(title),
            content_html: Some(self.sanitizer.clean(&body)),
            image,
            date_published: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        })
    }
}

/// Host (and port, if any) of the shop.
fn site_name(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => base_url.to_string(),
        },
        Err(_) => base_url.to_string(),
    }
}

/// Drop the query string and fragment from an image URL.
fn strip_query(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or(url).to_string()
}
