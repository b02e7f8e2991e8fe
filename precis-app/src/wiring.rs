use anyhow::{Context, Result};
use precis_actors::{
    actor::Addr,
    builder::Builder,
    keystore::{KeyStore, SqliteKeyStore},
    relay::{Relay, RelayActor},
};
use precis_config::PrecisConfig;
use precis_drivers::browser::driver::PrecisDriver;
use precis_llm::build_summarizer;
use precis_tui::{TuiActor, TuiMsg, spawn_tui_feeders, summary_html};
use precis_web::{
    Extractor, TabHost,
    captions::{CaptionFetcher, YOUTUBE_ORIGIN},
    content_script::ContentScript,
    host::{BrowserTabHost, StaticTabHost},
};
use std::sync::Arc;
use std::time::Duration;

const RELAY_MAILBOX: usize = 16;
const TUI_MAILBOX: usize = 256;

/// Where the "active tab" comes from.
#[derive(Debug, Clone)]
pub enum Target {
    /// Fetch this page over HTTP on every request.
    Static(String),
    /// The focused tab of a WebDriver browser session.
    Browser,
}

/// A tab host plus what the popup header should call it.
pub struct Host {
    pub tabs: Arc<dyn TabHost>,
    pub label: String,
    driver: Option<Arc<PrecisDriver>>,
}

impl Host {
    pub fn new(tabs: Arc<dyn TabHost>, label: impl Into<String>) -> Self {
        Self {
            tabs,
            label: label.into(),
            driver: None,
        }
    }

    /// End the browser session, if this host owns one.
    pub async fn close(self) {
        let Some(driver) = self.driver else { return };
        drop(self.tabs);
        match Arc::try_unwrap(driver) {
            Ok(driver) => {
                if let Err(e) = driver.close().await {
                    tracing::warn!(error = %e, "app.browser.close_failed");
                }
            }
            Err(_) => tracing::debug!("app.browser.still_shared"),
        }
    }
}

fn timeout(cfg: &PrecisConfig) -> Duration {
    Duration::from_secs(cfg.model.timeout_secs)
}

pub async fn open_key_store(cfg: &PrecisConfig) -> Result<Arc<dyn KeyStore>> {
    let path = cfg.key_store.resolved_path();
    let store = SqliteKeyStore::open(&path).await?;
    Ok(Arc::new(store))
}

pub fn content_script(cfg: &PrecisConfig) -> ContentScript {
    ContentScript::for_source(cfg.pipeline.source, &cfg.pipeline.transcript_selector)
}

pub fn build_extractor(cfg: &PrecisConfig) -> Result<Extractor> {
    let captions = CaptionFetcher::new(YOUTUBE_ORIGIN, timeout(cfg))
        .context("failed to build the caption client")?;
    Ok(Extractor::new(cfg.pipeline.source, captions))
}

pub async fn build_host(cfg: &PrecisConfig, target: &Target) -> Result<Host> {
    let script = content_script(cfg);
    match target {
        Target::Static(url) => {
            let tabs = StaticTabHost::fetch(url.clone(), timeout(cfg), script)
                .with_context(|| format!("cannot use {url} as the active tab"))?;
            Ok(Host::new(Arc::new(tabs), url.clone()))
        }
        Target::Browser => {
            let webdriver_url = &cfg.browser.webdriver_url;
            let driver = PrecisDriver::connect(webdriver_url, cfg.browser.headless)
                .await
                .with_context(|| format!("is a WebDriver server running at {webdriver_url}?"))?;
            if let Some(start) = &cfg.browser.start_url {
                driver
                    .goto(start)
                    .await
                    .with_context(|| format!("failed to open {start}"))?;
            }
            let driver = Arc::new(driver);
            let tabs = BrowserTabHost::new(driver.clone(), script);
            Ok(Host {
                tabs: Arc::new(tabs),
                label: format!("browser via {webdriver_url}"),
                driver: Some(driver),
            })
        }
    }
}

pub fn build_relay(
    cfg: &PrecisConfig,
    keys: Arc<dyn KeyStore>,
    tabs: Arc<dyn TabHost>,
) -> Result<Relay> {
    let summarizer = build_summarizer(cfg).context("failed to build the summarizer")?;
    let extractor = build_extractor(cfg)?;
    tracing::info!(
        source = ?cfg.pipeline.source,
        model = %summarizer.model_name(),
        "app.relay.ready"
    );
    Ok(Relay::new(keys, tabs, extractor, summarizer))
}

/// A finished summary as printed by `precis summarize`.
pub fn render_summary(summary: &str, html: bool) -> String {
    if html {
        summary_html(summary)
    } else {
        summary.to_string()
    }
}

/// Owns the actor builder for the popup's lifetime.
pub struct Wiring {
    builder: Builder,
}

impl Default for Wiring {
    fn default() -> Self {
        Self::new()
    }
}

impl Wiring {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
        }
    }

    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }

    pub async fn run(self) -> Result<()> {
        self.builder.run_until_shutdown().await
    }
}

/// Start the relay, then the popup last so every address it needs exists.
pub fn build_popup(
    w: &mut Wiring,
    relay: Relay,
    keys: Arc<dyn KeyStore>,
    label: &str,
) -> Result<()> {
    let b = w.builder_mut();
    let shutdown = b.shutdown_handle();

    // -------- PHASE 1: RESERVE --------
    let r_relay = b.reserve::<RelayActor>("relay:main", RELAY_MAILBOX);
    let r_tui = b.reserve::<TuiActor>("tui:main", TUI_MAILBOX);

    // -------- PHASE 2: RELAY --------
    b.start_reserved(
        r_relay,
        RelayActor::new(Arc::new(relay)).with_shutdown(&shutdown),
    );
    let relay_addr: Addr<RelayActor> = b.addr("relay:main").context("relay addr missing")?;

    // -------- PHASE 3: TUI LAST --------
    let tui_addr = r_tui.addr();
    let tui = TuiActor::new(relay_addr, keys, tui_addr.clone(), label, shutdown.clone())?;
    b.start_reserved(r_tui, tui);

    tui_addr
        .try_send(TuiMsg::Startup)
        .map_err(|_| anyhow::anyhow!("popup mailbox closed before startup"))?;
    spawn_tui_feeders(tui_addr, shutdown);
    Ok(())
}
