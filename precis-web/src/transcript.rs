//! Strategies for finding a video transcript in a page.
//!
//! Both strategies depend on the host site's markup or embedded player
//! data, and break when either changes. Keeping them behind
//! [`TranscriptLocator`] lets one be replaced without touching the relay or
//! the summarizer.
use anyhow::Result;
use async_trait::async_trait;
use precis_common::protocol::PageReply;
use precis_config::DEFAULT_TRANSCRIPT_SELECTOR;
use precis_drivers::dom::PageDom;
use serde::Deserialize;

/// Answers a video-transcript request from inside the page.
#[async_trait]
pub trait TranscriptLocator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Either the transcript text (`Content`, empty when none) or the
    /// address of a caption document (`TranscriptBaseUrl`).
    async fn locate(&self, dom: &dyn PageDom) -> Result<PageReply>;
}

/// Reads the transcript panel's rendered segments.
#[derive(Debug, Clone)]
pub struct SegmentTranscript {
    selector: String,
}

impl SegmentTranscript {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

impl Default for SegmentTranscript {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCRIPT_SELECTOR)
    }
}

#[async_trait]
impl TranscriptLocator for SegmentTranscript {
    fn name(&self) -> &'static str {
        "segments"
    }

    async fn locate(&self, dom: &dyn PageDom) -> Result<PageReply> {
        let segments = dom.select_texts(&self.selector).await?;
        let transcript = segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(segments = segments.len(), "web.transcript.segments");
        Ok(PageReply::Content(transcript))
    }
}

/// Finds the caption track advertised in the page's embedded player data.
#[derive(Debug, Clone, Default)]
pub struct CaptionTrackLocator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
}

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\"";

/// Text right after the `"captionTracks":` key, if the page has one.
fn after_caption_tracks_key(html: &str) -> Option<&str> {
    let start = html.find(CAPTION_TRACKS_KEY)? + CAPTION_TRACKS_KEY.len();
    html[start..].trim_start().strip_prefix(':')
}

/// Base URL of the preferred caption track in `html`: English if present,
/// otherwise the first listed.
pub fn find_caption_base_url(html: &str) -> Option<String> {
    let rest = after_caption_tracks_key(html)?;
    let tracks: Vec<CaptionTrack> = serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<CaptionTrack>>()
        .next()?
        .ok()?;

    let preferred = tracks
        .iter()
        .find(|t| t.language_code == "en")
        .or_else(|| tracks.iter().find(|t| t.language_code.starts_with("en-")))
        .or_else(|| tracks.first())?;
    Some(preferred.base_url.clone())
}

#[async_trait]
impl TranscriptLocator for CaptionTrackLocator {
    fn name(&self) -> &'static str {
        "caption_tracks"
    }

    async fn locate(&self, dom: &dyn PageDom) -> Result<PageReply> {
        let html = dom.html_source().await?;
        match find_caption_base_url(&html) {
            Some(url) => Ok(PageReply::TranscriptBaseUrl(url)),
            None => {
                tracing::debug!("web.transcript.no_caption_tracks");
                Ok(PageReply::Content(String::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    const PLAYER_HTML: &str = r#"<html><body><script>
var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
 {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=de","name":{"simpleText":"German"},"languageCode":"de"},
 {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","name":{"runs":[{"text":"English"}]},"languageCode":"en","kind":"asr"}
],"audioTracks":[]}}};
</script></body></html>"#;

    #[test]
    fn prefers_english_track() {
        assert_eq!(
            find_caption_base_url(PLAYER_HTML).as_deref(),
            Some("https://www.youtube.com/api/timedtext?v=abc&lang=en")
        );
    }

    #[test]
    fn falls_back_to_first_track() {
        let html = r#"{"captionTracks":[{"baseUrl":"/api/timedtext?lang=fr","languageCode":"fr"},{"baseUrl":"/api/timedtext?lang=es","languageCode":"es"}]}"#;
        assert_eq!(
            find_caption_base_url(html).as_deref(),
            Some("/api/timedtext?lang=fr")
        );
    }

    #[test]
    fn no_tracks_means_none() {
        assert_eq!(find_caption_base_url("<html></html>"), None);
        assert_eq!(find_caption_base_url(r#"{"captionTracks":[]}"#), None);
    }

    #[tokio::test]
    async fn segments_are_trimmed_and_space_joined() {
        let page = StaticPage::new(
            r#"<div id="segments-container">
                <div class="segment"><span class="yt-core-attributed-string">  Hello </span></div>
                <div class="segment"><span class="yt-core-attributed-string">there</span></div>
            </div>"#,
        );
        let reply = SegmentTranscript::default().locate(&page).await.unwrap();
        assert_eq!(reply, PageReply::Content("Hello there".into()));
    }

    #[tokio::test]
    async fn no_segments_is_empty_content() {
        let page = StaticPage::new("<p>video</p>");
        let reply = SegmentTranscript::default().locate(&page).await.unwrap();
        assert_eq!(reply, PageReply::Content(String::new()));
    }

    #[tokio::test]
    async fn caption_locator_replies_with_url() {
        let page = StaticPage::new(PLAYER_HTML);
        let reply = CaptionTrackLocator.locate(&page).await.unwrap();
        assert!(matches!(reply, PageReply::TranscriptBaseUrl(u) if u.ends_with("lang=en")));
    }
}
