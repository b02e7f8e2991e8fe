use crate::browser::page::WebDriverPage;
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Build the `goog:chromeOptions` capabilities for a session.
pub fn session_capabilities(headless: bool) -> Capabilities {
    let mut args = vec![json!("--no-first-run"), json!("--disable-extensions")];
    if headless {
        args.push(json!("--headless=new"));
        args.push(json!("--disable-gpu"));
    }

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// The session's focused tab is the "active tab" of the summarizer.
pub struct PrecisDriver {
    pub client: Client,
}

impl PrecisDriver {
    /// Connect to a running WebDriver service (Chromedriver on
    /// `http://localhost:9515` by default).
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(session_capabilities(headless))
            .connect(webdriver_url)
            .await
            .with_context(|| format!("failed to connect to WebDriver at {webdriver_url}"))?;
        tracing::info!(webdriver_url, headless, "driver.session.connected");
        Ok(Self { client })
    }

    /// Navigate the current tab to `url`.
    pub async fn goto(&self, url: &str) -> Result<WebDriverPage> {
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(self.current_page())
    }

    /// The tab the session currently focuses.
    pub fn current_page(&self) -> WebDriverPage {
        WebDriverPage::new(self.client.clone())
    }

    /// Address of the focused tab.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_adds_flags() {
        let caps = session_capabilities(true);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn headed_session_has_no_headless_flag() {
        let caps = session_capabilities(false);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a.as_str().unwrap_or("").starts_with("--headless")));
    }
}
