use crate::transcript::{CaptionTrackLocator, SegmentTranscript, TranscriptLocator};
use precis_common::protocol::{PageReply, PageRequest};
use precis_common::{ContentSource, PrecisError, RequestKind, Result};
use precis_drivers::dom::{DomError, PageDom};
use std::sync::Arc;

/// Page-side listener: answers one [`PageRequest`] from the page it runs in.
///
/// It is stateless, so hosts may run it afresh for every message.
#[derive(Clone)]
pub struct ContentScript {
    transcript: Arc<dyn TranscriptLocator>,
}

impl ContentScript {
    pub fn new(transcript: Arc<dyn TranscriptLocator>) -> Self {
        Self { transcript }
    }

    /// Script matching the configured pipeline flavor.
    pub fn for_source(source: ContentSource, transcript_selector: &str) -> Self {
        match source {
            ContentSource::CaptionFetch => Self::new(Arc::new(CaptionTrackLocator)),
            ContentSource::DomText | ContentSource::DirectUrl => {
                Self::new(Arc::new(SegmentTranscript::new(transcript_selector)))
            }
        }
    }

    /// A page that could not be reached is a transport failure; anything
    /// else that goes wrong means there was nothing to extract.
    pub async fn handle(&self, dom: &dyn PageDom, request: PageRequest) -> Result<PageReply> {
        let outcome = match request {
            PageRequest::GetPageContent => dom.body_text().await.map(PageReply::Content),
            PageRequest::GetVideoTranscript => self.transcript.locate(dom).await,
        };
        outcome.map_err(|err| {
            let kind = RequestKind::from(request);
            tracing::warn!(
                action = kind.action(),
                locator = self.transcript.name(),
                error = %err,
                "web.content_script.failed"
            );
            match err.downcast_ref::<DomError>() {
                Some(DomError::Session(reason)) => {
                    PrecisError::Transport(format!("Could not reach the page: {reason}"))
                }
                None => PrecisError::Extraction(
                    crate::extractor::empty_content_message(kind).to_string(),
                ),
            }
        })
    }
}
