//! Browser control over WebDriver

use async_trait::async_trait;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SuiteConfig, WebDriverConfig};
use crate::error::E2eResult;
use crate::selector::Selector;

/// Observable state of one matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementState {
    pub displayed: bool,
    pub enabled: bool,
}

impl ElementState {
    pub fn clickable(&self) -> bool {
        self.displayed && self.enabled
    }
}

/// The operations tests perform against a browser tab.
///
/// Element-level operations act on the first element matching the selector.
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    async fn source(&self) -> E2eResult<String>;

    /// All elements currently matching `selector`
    async fn query(&self, selector: &Selector) -> E2eResult<Vec<ElementState>>;

    async fn click(&self, selector: &Selector) -> E2eResult<()>;

    async fn clear(&self, selector: &Selector) -> E2eResult<()>;

    /// Type into the matched element, or into the focused one when `None`
    async fn send_keys(&self, selector: Option<&Selector>, text: &str) -> E2eResult<()>;

    async fn set_window_size(&self, width: u32, height: u32) -> E2eResult<()>;

    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;
}

/// A live WebDriver session driving Chrome
pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    /// Open a new browser session against a WebDriver endpoint
    pub async fn connect(endpoint: &str, config: &SuiteConfig) -> E2eResult<Self> {
        debug!("Opening browser session at {}", endpoint);

        let client = ClientBuilder::native()
            .capabilities(capabilities(&config.webdriver))
            .connect(endpoint)
            .await?;

        client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                None,
                Some(config.timeouts.implicit_wait()),
            ))
            .await?;

        info!("Browser session started");
        Ok(Self { client })
    }

    /// End the session and shut the browser down
    pub async fn close(self) -> E2eResult<()> {
        self.client.close().await?;
        debug!("Browser session closed");
        Ok(())
    }
}

/// W3C capabilities requesting Chrome with the configured arguments
pub fn capabilities(config: &WebDriverConfig) -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();
    caps.insert("browserName".to_string(), serde_json::json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": config.chrome_args() }),
    );
    caps
}

#[async_trait]
impl Page for BrowserSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn source(&self) -> E2eResult<String> {
        Ok(self.client.source().await?)
    }

    async fn query(&self, selector: &Selector) -> E2eResult<Vec<ElementState>> {
        let query = selector.query();
        let elements = self.client.find_all(query.locator()).await?;

        let mut states = Vec::with_capacity(elements.len());
        for element in elements {
            states.push(ElementState {
                displayed: element.is_displayed().await?,
                enabled: element.is_enabled().await?,
            });
        }
        Ok(states)
    }

    async fn click(&self, selector: &Selector) -> E2eResult<()> {
        let query = selector.query();
        self.client.find(query.locator()).await?.click().await?;
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> E2eResult<()> {
        let query = selector.query();
        self.client.find(query.locator()).await?.clear().await?;
        Ok(())
    }

    async fn send_keys(&self, selector: Option<&Selector>, text: &str) -> E2eResult<()> {
        let element = match selector {
            Some(selector) => {
                let query = selector.query();
                self.client.find(query.locator()).await?
            }
            None => self.client.active_element().await?,
        };
        element.send_keys(text).await?;
        Ok(())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> E2eResult<()> {
        self.client.set_window_size(width, height).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        Ok(self.client.execute(script, Vec::new()).await?)
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        Ok(self.client.screenshot().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_carry_chrome_args() {
        let caps = capabilities(&WebDriverConfig::default());
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert_eq!(caps["browserName"], "chrome");
    }

    #[test]
    fn test_clickable_requires_displayed_and_enabled() {
        assert!(ElementState { displayed: true, enabled: true }.clickable());
        assert!(!ElementState { displayed: true, enabled: false }.clickable());
        assert!(!ElementState { displayed: false, enabled: true }.clickable());
    }
}
