//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits so
//! the broker, searcher and HTTP layer can be exercised without a browser or
//! the real shop.
//!
//! # Example
//!
//! ```rust,ignore
//! use cruisefeed_core::testing::{fixtures, MockAutomation};
//!
//! let automation = Arc::new(MockAutomation::new().already_signed_in());
//! let broker = fixtures::broker(Arc::clone(&automation));
//!
//! broker.acquire().await?;
//! assert_eq!(automation.login_count(), 1);
//! ```

mod mock_automation;
mod mock_searcher;
mod static_secrets;

pub use mock_automation::MockAutomation;
pub use mock_searcher::MockSearcher;
pub use static_secrets::StaticSecrets;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::{MockAutomation, StaticSecrets};
    use crate::automation::BoundedWait;
    use crate::config::{Config, UpstreamConfig};
    use crate::searcher::CatalogResponse;
    use crate::session::{BrokerSettings, SessionBroker};

    /// Sign-in page used by `broker_settings`.
    pub const SIGNIN_URL: &str = "https://accounts.example.test/signin/";

    /// Logout page used by `broker_settings`.
    pub const LOGOUT_URL: &str = "https://planner.example.test/cruiseplanner/logout";

    /// Broker settings with millisecond waits and default selectors.
    pub fn broker_settings() -> BrokerSettings {
        let poll = Duration::from_millis(5);
        BrokerSettings {
            signin_url: SIGNIN_URL.to_string(),
            logout_url: LOGOUT_URL.to_string(),
            short_wait: BoundedWait::new(Duration::from_millis(20), poll),
            long_wait: BoundedWait::new(Duration::from_millis(50), poll),
            lockout_cooldown: Duration::from_secs(60),
            ..BrokerSettings::from_config(&Config::default())
        }
    }

    /// Secrets holding the default credential names.
    pub fn credentials() -> StaticSecrets {
        StaticSecrets::new()
            .with("rc_username", "sailor")
            .with("rc_password", "hunter2")
    }

    /// A broker over `automation` with `broker_settings` and `credentials`.
    pub fn broker(automation: Arc<MockAutomation>) -> SessionBroker {
        SessionBroker::new(broker_settings(), automation, Arc::new(credentials()))
            .expect("fixture credentials are complete")
    }

    /// Upstream endpoints rooted at `base_url` (must end with `/`).
    pub fn upstream_config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..UpstreamConfig::default()
        }
    }

    /// Catalog search body with `count` products, as the shop sends it.
    ///
    /// Even-numbered products carry a price and an image.
    pub fn catalog_json(count: usize) -> String {
        let tiles: Vec<_> = (1..=count)
            .map(|i| {
                if i % 2 == 0 {
                    json!({
                        "id": format!("{}", 1000 + i),
                        "title": format!("Product {}", i),
                        "description": format!("Description of product {}", i),
                        "image": {
                            "mediumImagePath": format!("https://img.example.test/{}.jpg?w=300", i)
                        },
                        "prices": [{"currencyCode": "USD", "formattedCost": format!("{}.99", i)}]
                    })
                } else {
                    json!({
                        "id": format!("{}", 1000 + i),
                        "title": format!("Product {}", i),
                        "description": format!("Description of product {}", i)
                    })
                }
            })
            .collect();

        json!({
            "resultCount": count,
            "groups": [{"tiles": tiles}]
        })
        .to_string()
    }

    /// Parsed form of `catalog_json`.
    pub fn catalog_response(count: usize) -> CatalogResponse {
        serde_json::from_str(&catalog_json(count)).expect("fixture JSON is valid")
    }
}
