//! The relay: one summarize request from credential check to response.
//!
//! Steps run in order and the first failure ends the request:
//! credential → active tab → extraction → summary. Every failure becomes a
//! [`RelayResponse::Error`] carrying the error's message; nothing here is
//! fatal to the process.
use crate::actor::{Actor, Context};
use crate::keystore::KeyStore;
use crate::system::ShutdownHandle;
use crate::RelayMsg;
use anyhow::Result as AnyResult;
use precis_common::protocol::RelayResponse;
use precis_common::{PrecisError, RequestId, RequestKind, Result};
use precis_llm::traits::Summarizer;
use precis_web::{ActiveTab, Extractor, TabHost};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::Instrument;
use url::Url;

pub const KEY_NOT_CONFIGURED: &str = "Gemini API key is not configured.";
pub const NO_ACTIVE_TAB: &str = "No active tab to summarize.";
pub const RESTRICTED_PAGE: &str = "Cannot summarize special browser pages or local files.";
pub const NOT_A_VIDEO_PAGE: &str = "This is not a YouTube video page.";

const RESTRICTED_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "edge",
    "about",
    "file",
    "view-source",
    "devtools",
    "data",
    "javascript",
];

/// Whether `url` shows a single YouTube video.
///
/// ```
/// use precis_actors::relay::is_youtube_video;
/// use url::Url;
///
/// let watch = Url::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
/// let short = Url::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// let home = Url::parse("https://www.youtube.com/").unwrap();
/// assert!(is_youtube_video(&watch) && is_youtube_video(&short));
/// assert!(!is_youtube_video(&home));
/// ```
pub fn is_youtube_video(url: &Url) -> bool {
    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return false;
    };
    let path = url.path();
    match host.as_str() {
        "youtu.be" | "www.youtu.be" => !path.trim_matches('/').is_empty(),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => {
            let watch = path == "/watch"
                && url
                    .query_pairs()
                    .any(|(k, v)| k == "v" && !v.trim().is_empty());
            let short = path
                .strip_prefix("/shorts/")
                .is_some_and(|id| !id.trim_matches('/').is_empty());
            watch || short
        }
        _ => false,
    }
}

/// Reject tabs that cannot be summarized for `kind`.
pub fn check_target(tab_url: &str, kind: RequestKind) -> Result<()> {
    let restricted = || PrecisError::Navigation(RESTRICTED_PAGE.to_string());
    let url = Url::parse(tab_url).map_err(|_| restricted())?;
    if RESTRICTED_SCHEMES.contains(&url.scheme()) {
        return Err(restricted());
    }
    if kind == RequestKind::VideoTranscript && !is_youtube_video(&url) {
        return Err(PrecisError::Navigation(NOT_A_VIDEO_PAGE.to_string()));
    }
    Ok(())
}

/// Everything a summarize request needs, wired once at startup.
pub struct Relay {
    keys: Arc<dyn KeyStore>,
    host: Arc<dyn TabHost>,
    extractor: Extractor,
    summarizer: Arc<dyn Summarizer>,
}

impl Relay {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        host: Arc<dyn TabHost>,
        extractor: Extractor,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            keys,
            host,
            extractor,
            summarizer,
        }
    }

    /// Run one request to completion.
    pub async fn run(&self, kind: RequestKind) -> RelayResponse {
        let request_id = RequestId::new();
        let span = tracing::info_span!("relay.request", %request_id, %kind);
        async {
            match self.pipeline(kind).await {
                Ok(summary) => {
                    tracing::info!(summary_chars = summary.chars().count(), "relay.done");
                    RelayResponse::Summary(summary)
                }
                Err(err) => {
                    tracing::warn!(category = err.category(), error = %err, "relay.failed");
                    RelayResponse::from(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn pipeline(&self, kind: RequestKind) -> Result<String> {
        let credential = self
            .keys
            .get()
            .await
            .ok_or_else(|| PrecisError::Configuration(KEY_NOT_CONFIGURED.to_string()))?;

        let tab: ActiveTab = self
            .host
            .active_tab()
            .await?
            .ok_or_else(|| PrecisError::Navigation(NO_ACTIVE_TAB.to_string()))?;
        check_target(&tab.url, kind)?;
        tracing::debug!(url = %tab.url, source = ?self.extractor.source(), "relay.extract.start");

        let payload = self.extractor.extract(self.host.as_ref(), &tab, kind).await?;

        tracing::debug!(model = %self.summarizer.model_name(), "relay.summarize.start");
        self.summarizer.summarize(payload, &credential, kind).await
    }
}

/// Serves [`RelayMsg`]s one at a time, in mailbox order.
///
/// With a shutdown subscription, a request still in flight when shutdown is
/// signalled is abandoned and its reply channel dropped.
pub struct RelayActor {
    relay: Arc<Relay>,
    shutdown: Option<broadcast::Receiver<()>>,
}

impl RelayActor {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            shutdown: None,
        }
    }

    /// Abandon in-flight requests once `handle` signals.
    ///
    /// Subscribes now, so a signal sent before the first message is not missed.
    pub fn with_shutdown(mut self, handle: &ShutdownHandle) -> Self {
        self.shutdown = Some(handle.subscribe());
        self
    }
}

#[async_trait::async_trait]
impl Actor for RelayActor {
    type Msg = RelayMsg;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> AnyResult<()> {
        match msg {
            RelayMsg::Summarize { kind, reply } => {
                let response = match self.shutdown.as_mut() {
                    Some(shutdown) => tokio::select! {
                        _ = shutdown.recv() => {
                            tracing::debug!(%kind, "relay.cancelled");
                            return Ok(());
                        }
                        response = self.relay.run(kind) => response,
                    },
                    None => self.relay.run(kind).await,
                };
                if reply.send(response).is_err() {
                    tracing::debug!(%kind, "relay.reply_dropped");
                }
            }
        }
        Ok(())
    }
}
