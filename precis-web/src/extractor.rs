use crate::captions::CaptionFetcher;
use crate::host::{ActiveTab, TabHost};
use precis_common::protocol::{PageReply, PageRequest};
use precis_common::{ContentSource, ExtractedPayload, PrecisError, RequestKind, Result};

pub const NO_PAGE_CONTENT: &str = "Could not retrieve content from this page.";
pub const NO_TRANSCRIPT: &str = "No transcript or captions are available for this video.";

/// What the user sees when a kind of request yields nothing.
pub fn empty_content_message(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::PageContent => NO_PAGE_CONTENT,
        RequestKind::VideoTranscript => NO_TRANSCRIPT,
    }
}

/// Turns a request kind into material for the summarizer.
#[derive(Clone)]
pub struct Extractor {
    source: ContentSource,
    captions: CaptionFetcher,
}

impl Extractor {
    pub fn new(source: ContentSource, captions: CaptionFetcher) -> Self {
        Self { source, captions }
    }

    pub fn source(&self) -> ContentSource {
        self.source
    }

    /// Extract from `tab`. Blank results are errors, so a successful payload
    /// always carries something to summarize.
    pub async fn extract(
        &self,
        host: &dyn TabHost,
        tab: &ActiveTab,
        kind: RequestKind,
    ) -> Result<ExtractedPayload> {
        if self.source == ContentSource::DirectUrl {
            return Ok(ExtractedPayload::Url(tab.url.clone()));
        }

        let empty = || PrecisError::Extraction(empty_content_message(kind).to_string());

        let text = match host.send_message(tab, PageRequest::from(kind)).await? {
            PageReply::Content(text) => text,
            PageReply::TranscriptBaseUrl(url) => {
                if url.trim().is_empty() {
                    return Err(empty());
                }
                tracing::debug!(%kind, "web.extract.captions");
                self.captions.fetch(&url).await?
            }
        };

        if text.trim().is_empty() {
            tracing::info!(%kind, url = %tab.url, "web.extract.empty");
            return Err(empty());
        }
        tracing::debug!(%kind, chars = text.chars().count(), "web.extract.done");
        Ok(ExtractedPayload::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::YOUTUBE_ORIGIN;
    use crate::content_script::ContentScript;
    use crate::host::StaticTabHost;
    use std::time::Duration;

    fn extractor(source: ContentSource) -> Extractor {
        let captions = CaptionFetcher::new(YOUTUBE_ORIGIN, Duration::from_secs(5)).unwrap();
        Extractor::new(source, captions)
    }

    fn host(url: &str, html: &str, source: ContentSource) -> StaticTabHost {
        StaticTabHost::inline(url, html, ContentScript::for_source(source, "#segments-container .segment"))
    }

    #[tokio::test]
    async fn page_text_is_extracted() {
        let h = host("https://example.com", "<body>Hello world</body>", ContentSource::DomText);
        let tab = ActiveTab::new("https://example.com");
        let got = extractor(ContentSource::DomText)
            .extract(&h, &tab, RequestKind::PageContent)
            .await
            .unwrap();
        assert_eq!(got, ExtractedPayload::Text("Hello world".into()));
    }

    #[tokio::test]
    async fn blank_page_is_an_extraction_error() {
        let h = host("https://example.com", "<body>   </body>", ContentSource::DomText);
        let tab = ActiveTab::new("https://example.com");
        let err = extractor(ContentSource::DomText)
            .extract(&h, &tab, RequestKind::PageContent)
            .await
            .unwrap_err();
        assert_eq!(err, PrecisError::Extraction(NO_PAGE_CONTENT.into()));
    }

    #[tokio::test]
    async fn missing_transcript_is_an_extraction_error() {
        let url = "https://www.youtube.com/watch?v=abc";
        let h = host(url, "<body>player</body>", ContentSource::DomText);
        let err = extractor(ContentSource::DomText)
            .extract(&h, &ActiveTab::new(url), RequestKind::VideoTranscript)
            .await
            .unwrap_err();
        assert_eq!(err, PrecisError::Extraction(NO_TRANSCRIPT.into()));
    }

    #[tokio::test]
    async fn no_caption_tracks_is_an_extraction_error() {
        let url = "https://www.youtube.com/watch?v=abc";
        let h = host(url, "<body>player</body>", ContentSource::CaptionFetch);
        let err = extractor(ContentSource::CaptionFetch)
            .extract(&h, &ActiveTab::new(url), RequestKind::VideoTranscript)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("transcript or captions"));
    }

    #[tokio::test]
    async fn direct_url_skips_the_page() {
        let h = host("https://example.com", "<body></body>", ContentSource::DirectUrl);
        let tab = ActiveTab::new("https://example.com/article");
        let got = extractor(ContentSource::DirectUrl)
            .extract(&h, &tab, RequestKind::PageContent)
            .await
            .unwrap();
        assert_eq!(got, ExtractedPayload::Url("https://example.com/article".into()));
    }
}
