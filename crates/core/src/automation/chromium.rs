//! Headless Chromium automation over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;

use super::{Automation, AutomationError, Locator};

/// A launched browser with the single page all steps run in.
struct BrowserSession {
    // Held so the child process lives as long as the session.
    _browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Chromium-backed `Automation`.
///
/// The browser is launched on first use, so the service can start (and
/// serve validation errors) on hosts without Chromium installed.
pub struct ChromiumAutomation {
    config: BrowserConfig,
    session: Mutex<Option<BrowserSession>>,
}

impl ChromiumAutomation {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<BrowserSession, AutomationError> {
        let mut builder = CdpBrowserConfig::builder().no_sandbox();
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }
        let cdp_config = builder.build().map_err(AutomationError::BrowserUnavailable)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| AutomationError::BrowserUnavailable(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AutomationError::BrowserUnavailable(e.to_string()))?;

        info!(headless = self.config.headless, "Browser launched");

        Ok(BrowserSession {
            _browser: browser,
            page,
            handler,
        })
    }

    /// The session page, launching the browser if needed.
    async fn page(&self) -> Result<Page, AutomationError> {
        let mut session = self.session.lock().await;

        if let Some(existing) = session.as_ref() {
            if !existing.handler.is_finished() {
                return Ok(existing.page.clone());
            }
            warn!("Browser connection lost, relaunching");
        }

        let launched = self.launch().await?;
        let page = launched.page.clone();
        *session = Some(launched);
        Ok(page)
    }
}

#[async_trait]
impl Automation for ChromiumAutomation {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        let page = self.page().await?;
        page.goto(url)
            .await
            .map_err(|e| AutomationError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        debug!(url = url, "Browser navigated");
        Ok(())
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool, AutomationError> {
        let page = self.page().await?;
        Ok(page.find_element(locator.css()).await.is_ok())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), AutomationError> {
        let page = self.page().await?;
        let element = page
            .find_element(locator.css())
            .await
            .map_err(|_| AutomationError::ElementNotFound(locator.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| AutomationError::Action(format!("focus {}: {}", locator, e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| AutomationError::Action(format!("type into {}: {}", locator, e)))?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), AutomationError> {
        let page = self.page().await?;
        let element = page
            .find_element(locator.css())
            .await
            .map_err(|_| AutomationError::ElementNotFound(locator.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| AutomationError::Action(format!("click {}: {}", locator, e)))?;
        Ok(())
    }

    async fn cookie(&self, name: &str) -> Result<Option<String>, AutomationError> {
        let page = self.page().await?;
        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| AutomationError::Action(format!("read cookies: {}", e)))?;
        Ok(cookies
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        let automation = ChromiumAutomation::new(BrowserConfig::default());
        assert_eq!(automation.name(), "chromium");
    }

    #[tokio::test]
    async fn test_missing_executable_is_browser_unavailable() {
        let automation = ChromiumAutomation::new(BrowserConfig {
            headless: true,
            executable: Some("/nonexistent/chromium".into()),
        });
        let err = automation.navigate("about:blank").await.unwrap_err();
        assert!(matches!(err, AutomationError::BrowserUnavailable(_)));
    }
}
