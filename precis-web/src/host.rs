//! The active tab, and delivery of page requests to it.
use crate::content_script::ContentScript;
use crate::page::StaticPage;
use async_trait::async_trait;
use precis_common::protocol::{PageReply, PageRequest};
use precis_common::{PrecisError, Result};
use precis_drivers::browser::driver::PrecisDriver;
use precis_http::{HttpClient, RequestOpts};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The page the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTab {
    pub url: String,
}

impl ActiveTab {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Where tabs live and how the content script is reached.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The focused tab, if any.
    async fn active_tab(&self) -> Result<Option<ActiveTab>>;

    /// Run the content script in `tab` and return its reply. The script is
    /// injected per message; nothing is kept between calls.
    async fn send_message(&self, tab: &ActiveTab, request: PageRequest) -> Result<PageReply>;
}

enum StaticSource {
    Fetch { http: HttpClient, timeout: Duration },
    Inline { html: String },
    Unreachable,
}

/// A single page known up front, fetched over HTTP or given inline.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> precis_common::Result<()> {
/// use precis_common::protocol::{PageReply, PageRequest};
/// use precis_common::ContentSource;
/// use precis_web::content_script::ContentScript;
/// use precis_web::host::{StaticTabHost, TabHost};
///
/// let host = StaticTabHost::inline(
///     "https://example.com",
///     "<body><p>Hello world</p></body>",
///     ContentScript::for_source(ContentSource::DomText, "#none"),
/// );
/// let tab = host.active_tab().await?.expect("one tab");
/// let reply = host.send_message(&tab, PageRequest::GetPageContent).await?;
/// assert_eq!(reply, PageReply::Content("Hello world".into()));
/// # Ok(())
/// # }
/// ```
pub struct StaticTabHost {
    url: String,
    source: StaticSource,
    script: ContentScript,
}

impl StaticTabHost {
    /// Fetch `url` on every message.
    ///
    /// Addresses without a network origin (`file:`, `about:`, unparseable
    /// text) still yield a tab, so the relay can reject it by URL; loading
    /// such a page fails.
    pub fn fetch(url: impl Into<String>, timeout: Duration, script: ContentScript) -> Result<Self> {
        let url = url.into();
        let origin = Url::parse(&url).ok().map(|u| u.origin());
        let source = match origin {
            Some(origin) if origin.is_tuple() => {
                let http = HttpClient::new(&origin.ascii_serialization()).map_err(|e| {
                    PrecisError::Configuration(format!("Invalid page URL {url}: {e}"))
                })?;
                StaticSource::Fetch { http, timeout }
            }
            _ => StaticSource::Unreachable,
        };
        Ok(Self {
            url,
            source,
            script,
        })
    }

    /// Serve fixed HTML as the page at `url`.
    pub fn inline(url: impl Into<String>, html: impl Into<String>, script: ContentScript) -> Self {
        Self {
            url: url.into(),
            source: StaticSource::Inline { html: html.into() },
            script,
        }
    }

    async fn load(&self, tab: &ActiveTab) -> Result<StaticPage> {
        let html = match &self.source {
            StaticSource::Inline { html } => html.clone(),
            StaticSource::Unreachable => {
                return Err(PrecisError::Navigation(format!(
                    "The page at {} cannot be loaded.",
                    tab.url
                )));
            }
            StaticSource::Fetch { http, timeout } => {
                let opts = RequestOpts {
                    timeout: Some(*timeout),
                    allow_absolute: true,
                    ..Default::default()
                };
                http.get_text(&tab.url, opts).await.map_err(|e| {
                    tracing::warn!(url = %tab.url, error = %e, "web.host.static.fetch_failed");
                    PrecisError::Transport(format!("Failed to load the page: {e}"))
                })?
            }
        };
        Ok(StaticPage::new(html))
    }
}

#[async_trait]
impl TabHost for StaticTabHost {
    async fn active_tab(&self) -> Result<Option<ActiveTab>> {
        Ok(Some(ActiveTab::new(self.url.clone())))
    }

    async fn send_message(&self, tab: &ActiveTab, request: PageRequest) -> Result<PageReply> {
        let page = self.load(tab).await?;
        self.script.handle(&page, request).await
    }
}

/// The focused tab of a WebDriver browser session.
pub struct BrowserTabHost {
    driver: Arc<PrecisDriver>,
    script: ContentScript,
}

impl BrowserTabHost {
    pub fn new(driver: Arc<PrecisDriver>, script: ContentScript) -> Self {
        Self { driver, script }
    }
}

#[async_trait]
impl TabHost for BrowserTabHost {
    async fn active_tab(&self) -> Result<Option<ActiveTab>> {
        match self.driver.current_url().await {
            Ok(url) => Ok(Some(ActiveTab::new(url))),
            Err(err) => {
                tracing::warn!(error = %err, "web.host.browser.no_current_url");
                Ok(None)
            }
        }
    }

    async fn send_message(&self, tab: &ActiveTab, request: PageRequest) -> Result<PageReply> {
        let page = self.driver.current_page();
        tracing::debug!(url = %tab.url, action = ?request, "web.host.browser.send");
        self.script.handle(&page, request).await
    }
}
