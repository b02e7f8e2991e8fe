use crate::prompt;
use crate::traits::Summarizer;
use async_trait::async_trait;
use precis_common::{Credential, ExtractedPayload, PrecisError, RequestKind, Result};
use precis_config::{DEFAULT_MAX_SOURCE_CHARS, DEFAULT_MODEL};
use precis_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::time::Duration;

const ANSWER_POINTER: &str = "/candidates/0/content/parts/0/text";
const INVALID_RESPONSE: &str = "The API response was invalid.";
const NO_SUMMARY: &str = "The model did not return a summary. It might be unable to access the URL or the content may be blocked.";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

/// Search grounding lets the model fetch a URL it was handed.
#[derive(Debug, Serialize)]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

/// Google Gemini `generateContent` client.
///
/// One POST per summary; the API key rides in the `key` query parameter.
pub struct GeminiClient {
    http: HttpClient,
    model: String,
    max_source_chars: usize,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a client for `model` served under `endpoint`.
    ///
    /// ```
    /// use precis_llm::gemini::GeminiClient;
    /// use precis_llm::traits::Summarizer;
    ///
    /// let client = GeminiClient::new("https://generativelanguage.googleapis.com/v1beta", "gemini-test")
    ///     .expect("valid endpoint")
    ///     .with_max_source_chars(30_000);
    /// assert_eq!(client.model_name(), "gemini-test");
    /// ```
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self> {
        let http = HttpClient::new(endpoint).map_err(|e| {
            PrecisError::Configuration(format!("Invalid Gemini endpoint {endpoint}: {e}"))
        })?;
        let model = model.into();
        Ok(Self {
            timeout: http.default_timeout,
            http,
            model: if model.trim().is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Character budget for extracted text; zero keeps the current value.
    pub fn with_max_source_chars(mut self, max: usize) -> Self {
        if max > 0 {
            self.max_source_chars = max;
        }
        self
    }

    fn build_request(&self, payload: &ExtractedPayload, kind: RequestKind) -> GeminiRequest {
        let text = prompt::render(payload, kind, self.max_source_chars);
        let tools = match payload {
            ExtractedPayload::Url(_) => Some(vec![GeminiTool {
                google_search: GoogleSearch {},
            }]),
            ExtractedPayload::Text(_) => None,
        };
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text }],
            }],
            tools,
        }
    }
}

fn map_http_error(err: HttpError) -> PrecisError {
    match err {
        HttpError::Api { message, .. } => {
            PrecisError::Transport(format!("Gemini API error: {message}"))
        }
        HttpError::Decode(..) => PrecisError::ResponseShape(INVALID_RESPONSE.to_string()),
        HttpError::Network(msg) => PrecisError::Transport(format!("Gemini request failed: {msg}")),
        HttpError::Url(msg) | HttpError::Build(msg) => {
            PrecisError::Transport(format!("Gemini request could not be built: {msg}"))
        }
    }
}

fn answer_text(body: &JsonValue) -> Result<String> {
    match body.pointer(ANSWER_POINTER).and_then(JsonValue::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => {
            let finish_reason = body
                .pointer("/candidates/0/finishReason")
                .and_then(JsonValue::as_str)
                .unwrap_or("-");
            tracing::warn!(finish_reason, "llm.gemini.no_summary");
            Err(PrecisError::ResponseShape(NO_SUMMARY.to_string()))
        }
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(
        &self,
        payload: ExtractedPayload,
        credential: &Credential,
        kind: RequestKind,
    ) -> Result<String> {
        let request = self.build_request(&payload, kind);
        let path = format!("models/{}:generateContent", self.model);

        tracing::debug!(
            model = %self.model,
            %kind,
            grounded = request.tools.is_some(),
            prompt_chars = request.contents[0].parts[0].text.chars().count(),
            "llm.gemini.request"
        );

        let opts = RequestOpts {
            timeout: Some(self.timeout),
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(credential.expose()),
            }),
            ..Default::default()
        };

        let body: JsonValue = self
            .http
            .post_json_opts(&path, &request, opts)
            .await
            .map_err(map_http_error)?;

        let text = answer_text(&body)?;
        tracing::debug!(model = %self.model, summary_chars = text.chars().count(), "llm.gemini.summary");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new("https://example.invalid/v1beta", "m").unwrap()
    }

    #[test]
    fn text_payload_has_no_tools() {
        let req = client().build_request(
            &ExtractedPayload::Text("Hello world".into()),
            RequestKind::PageContent,
        );
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tools").is_none());
        let text = v["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Hello world"));
    }

    #[test]
    fn url_payload_requests_search_tool() {
        let req = client().build_request(
            &ExtractedPayload::Url("https://example.com".into()),
            RequestKind::PageContent,
        );
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["tools"], json!([{ "google_search": {} }]));
    }

    #[test]
    fn empty_answer_is_a_shape_error() {
        let body = json!({ "candidates": [{ "content": { "parts": [{ "text": "" }] } }] });
        assert_eq!(
            answer_text(&body),
            Err(PrecisError::ResponseShape(NO_SUMMARY.into()))
        );
    }

    #[test]
    fn api_error_keeps_server_message() {
        let err = map_http_error(HttpError::Api {
            status: precis_http_status(400),
            message: "API key not valid.".into(),
            request_id: "-".into(),
        });
        assert_eq!(
            err,
            PrecisError::Transport("Gemini API error: API key not valid.".into())
        );
    }

    #[test]
    fn blank_model_falls_back_to_default() {
        let c = GeminiClient::new("https://example.invalid", " ").unwrap();
        assert_eq!(c.model_name(), DEFAULT_MODEL);
    }

    fn precis_http_status(code: u16) -> precis_http::StatusCode {
        precis_http::StatusCode::from_u16(code).unwrap()
    }
}
