//! Message contracts between the popup, the relay and the page.
//!
//! The JSON shapes match what the browser extension exchanged, so a page-side
//! script written in any language can speak to the relay:
//!
//! ```
//! use precis_common::protocol::{PageReply, PageRequest, RelayResponse};
//!
//! let req: PageRequest = serde_json::from_str(r#"{"action":"getPageContent"}"#).unwrap();
//! assert_eq!(req, PageRequest::GetPageContent);
//!
//! let reply: PageReply = serde_json::from_str(r#"{"transcriptBaseUrl":"https://x/y"}"#).unwrap();
//! assert_eq!(reply, PageReply::TranscriptBaseUrl("https://x/y".into()));
//!
//! let out = serde_json::to_string(&RelayResponse::Error("nope".into())).unwrap();
//! assert_eq!(out, r#"{"error":"nope"}"#);
//! ```
use crate::{PrecisError, RequestKind};
use serde::{Deserialize, Serialize};

/// Relay → page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PageRequest {
    #[serde(rename = "getPageContent")]
    GetPageContent,
    #[serde(rename = "getVideoTranscript")]
    GetVideoTranscript,
}

impl From<RequestKind> for PageRequest {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::PageContent => PageRequest::GetPageContent,
            RequestKind::VideoTranscript => PageRequest::GetVideoTranscript,
        }
    }
}

impl From<PageRequest> for RequestKind {
    fn from(request: PageRequest) -> Self {
        match request {
            PageRequest::GetPageContent => RequestKind::PageContent,
            PageRequest::GetVideoTranscript => RequestKind::VideoTranscript,
        }
    }
}

/// Page → relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageReply {
    /// Extracted text; may be empty when nothing was found.
    Content(String),
    /// Caption document location, fetched by the relay side.
    TranscriptBaseUrl(String),
}

/// Relay → popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayResponse {
    Summary(String),
    Error(String),
}

impl From<crate::Result<String>> for RelayResponse {
    fn from(outcome: crate::Result<String>) -> Self {
        match outcome {
            Ok(summary) => RelayResponse::Summary(summary),
            Err(err) => RelayResponse::Error(err.to_string()),
        }
    }
}

impl From<PrecisError> for RelayResponse {
    fn from(err: PrecisError) -> Self {
        RelayResponse::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_reply_content_shape() {
        let v = serde_json::to_value(PageReply::Content("hi".into())).unwrap();
        assert_eq!(v, json!({ "content": "hi" }));
    }

    #[test]
    fn page_request_from_kind() {
        assert_eq!(
            PageRequest::from(RequestKind::VideoTranscript),
            PageRequest::GetVideoTranscript
        );
        let v = serde_json::to_value(PageRequest::GetVideoTranscript).unwrap();
        assert_eq!(v, json!({ "action": "getVideoTranscript" }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let parsed = serde_json::from_str::<PageRequest>(r#"{"action":"getEverything"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn relay_response_from_outcome() {
        let ok: crate::Result<String> = Ok("- a".into());
        assert_eq!(RelayResponse::from(ok), RelayResponse::Summary("- a".into()));

        let err: crate::Result<String> =
            Err(PrecisError::Configuration("Gemini API key is not configured.".into()));
        assert_eq!(
            serde_json::to_value(RelayResponse::from(err)).unwrap(),
            json!({ "error": "Gemini API key is not configured." })
        );
    }
}
