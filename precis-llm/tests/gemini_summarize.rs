mod common;

use precis_common::{Credential, ExtractedPayload, PrecisError, RequestKind};
use precis_llm::gemini::GeminiClient;
use precis_llm::traits::Summarizer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

async fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(&format!("{}/v1beta", server.uri()), MODEL).expect("client")
}

fn sent_prompt(body: &[u8]) -> String {
    let v: Value = serde_json::from_slice(body).expect("json body");
    v["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text")
        .to_string()
}

#[tokio::test]
async fn returns_first_candidate_text() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "X" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = client_for(&server)
        .await
        .summarize(
            ExtractedPayload::Text("Hello world".into()),
            &Credential::new("test-key"),
            RequestKind::PageContent,
        )
        .await
        .unwrap();
    assert_eq!(summary, "X");
}

#[tokio::test]
async fn missing_candidates_is_a_shape_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": {} })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .summarize(
            ExtractedPayload::Text("Hello world".into()),
            &Credential::new("k"),
            RequestKind::PageContent,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PrecisError::ResponseShape(_)));
    assert!(err.to_string().starts_with("The model did not return a summary."));
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .summarize(
            ExtractedPayload::Text("Hello".into()),
            &Credential::new("k"),
            RequestKind::VideoTranscript,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PrecisError::ResponseShape("The API response was invalid.".into())
    );
}

#[tokio::test]
async fn api_error_message_is_surfaced_once() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .summarize(
            ExtractedPayload::Text("Hello".into()),
            &Credential::new("bad"),
            RequestKind::PageContent,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PrecisError::Transport(
            "Gemini API error: API key not valid. Please pass a valid API key.".into()
        )
    );
}

#[tokio::test]
async fn long_text_is_truncated_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .mount(&server)
        .await;

    let source = format!("{}{}", "a".repeat(100), "b".repeat(100));
    client_for(&server)
        .await
        .with_max_source_chars(100)
        .summarize(
            ExtractedPayload::Text(source),
            &Credential::new("k"),
            RequestKind::PageContent,
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.expect("recorded");
    let prompt = sent_prompt(&requests[0].body);
    assert!(prompt.contains(&"a".repeat(100)));
    assert!(!prompt.contains('b'));
}

#[tokio::test]
async fn url_payload_sends_search_tool_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "- a\n- b" }] } }]
        })))
        .mount(&server)
        .await;

    let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    let summary = client_for(&server)
        .await
        .summarize(
            ExtractedPayload::Url(url.into()),
            &Credential::new("k"),
            RequestKind::VideoTranscript,
        )
        .await
        .unwrap();
    assert_eq!(summary, "- a\n- b");

    let requests = server.received_requests().await.expect("recorded");
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["tools"], json!([{ "google_search": {} }]));
    assert!(sent_prompt(&requests[0].body).contains(url));
}
