pub mod automation;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod searcher;
pub mod secrets;
pub mod session;
pub mod testing;

pub use automation::{Automation, AutomationError, BoundedWait, ChromiumAutomation, Locator};
pub use catalog::{Category, CategoryRegistry, RegistryError};
pub use config::{
    load_config, load_config_from_str, validate_config, BrowserConfig, Config, ConfigError,
    FeedConfig, SanitizedConfig, SecretsConfig, ServerConfig, SessionConfig, UpstreamConfig,
};
pub use feed::{
    AllowListSanitizer, FeedAssembler, FeedItem, HtmlSanitizer, JsonFeed, JSON_FEED_CONTENT_TYPE,
    JSON_FEED_VERSION,
};
pub use pipeline::{FeedError, FeedErrorKind, FeedPipeline};
pub use query::{invalid_query_message, validate, SearchQuery};
pub use searcher::{CatalogResponse, CatalogTile, PlannerSearcher, SearchError, Searcher};
pub use secrets::{Credentials, DockerSecrets, SecretError, SecretProvider};
pub use session::{BrokerSettings, SessionBroker, SessionError, SessionState, SessionToken};
