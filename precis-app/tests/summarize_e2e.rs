use precis_actors::actor::spawn_actor;
use precis_actors::keystore::{KeyStore, MemoryKeyStore};
use precis_actors::relay::RelayActor;
use precis_actors::RelayMsg;
use precis_app::wiring::{build_host, build_relay, content_script, render_summary, Target};
use precis_common::protocol::RelayResponse;
use precis_common::RequestKind;
use precis_config::{PrecisConfig, PrecisConfigLoader};
use precis_tui::{summary_lines, Panel};
use precis_web::host::StaticTabHost;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-e2e:generateContent";

fn config_for(server: &MockServer, extra: &str) -> PrecisConfig {
    PrecisConfigLoader::new()
        .with_yaml_str(&format!(
            "model:\n  name: gemini-e2e\n  endpoint: \"{}/v1beta\"\n  timeout_secs: 5\n{extra}",
            server.uri()
        ))
        .load()
        .unwrap()
}

fn prompt_of(request: &Request) -> String {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn mount_gemini(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "AIza-e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": answer }] } }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn page_summary_reaches_the_panel_as_two_lines() {
    let server = MockServer::start().await;
    mount_gemini(&server, "- point one\n- point two").await;

    let cfg = config_for(&server, "");
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::with_key("AIza-e2e"));
    let tabs = StaticTabHost::inline(
        "https://example.com",
        "<html><head><title>t</title></head><body><p>Hello world</p></body></html>",
        content_script(&cfg),
    );
    let relay = build_relay(&cfg, keys, Arc::new(tabs)).unwrap();

    let handle = spawn_actor(RelayActor::new(Arc::new(relay)), 4);
    let (reply, rx) = oneshot::channel();
    handle
        .addr
        .send(RelayMsg::Summarize {
            kind: RequestKind::PageContent,
            reply,
        })
        .await
        .ok();
    let response = rx.await.unwrap();

    let panel = Panel::from(response);
    let Panel::Summary(text) = &panel else {
        panic!("expected a summary, got {panel:?}");
    };
    assert_eq!(summary_lines(text), vec!["- point one", "- point two"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = prompt_of(&requests[0]);
    assert!(prompt.contains("Hello world"), "prompt was {prompt:?}");
    assert!(prompt.contains("web page"));

    drop(handle.addr);
    handle.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn video_without_transcript_fails_before_the_model() {
    let server = MockServer::start().await;
    mount_gemini(&server, "unused").await;

    let cfg = config_for(&server, "");
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::with_key("AIza-e2e"));
    let tabs = StaticTabHost::inline(
        "https://www.youtube.com/watch?v=abc123",
        "<html><body><h1>A video</h1><div id=\"segments-container\"></div></body></html>",
        content_script(&cfg),
    );
    let relay = build_relay(&cfg, keys, Arc::new(tabs)).unwrap();

    let RelayResponse::Error(message) = relay.run(RequestKind::VideoTranscript).await else {
        panic!("expected an error");
    };
    let lower = message.to_lowercase();
    assert!(lower.contains("transcript") || lower.contains("captions"), "{message}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_key_is_reported_without_any_request() {
    let server = MockServer::start().await;
    let cfg = config_for(&server, "pipeline:\n  source: direct_url\n");
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
    let host = build_host(&cfg, &Target::Static(format!("{}/article", server.uri())))
        .await
        .unwrap();
    let relay = build_relay(&cfg, keys, host.tabs.clone()).unwrap();

    assert_eq!(
        relay.run(RequestKind::PageContent).await,
        RelayResponse::Error("Gemini API key is not configured.".into())
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn static_page_is_fetched_and_summarized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<body><script>var x;</script><p>Crabs molt.</p></body>"),
        )
        .mount(&server)
        .await;
    mount_gemini(&server, "- crabs molt").await;

    let cfg = config_for(&server, "");
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::with_key("AIza-e2e"));
    let host = build_host(&cfg, &Target::Static(format!("{}/article", server.uri())))
        .await
        .unwrap();
    let relay = build_relay(&cfg, keys, host.tabs.clone()).unwrap();

    assert_eq!(
        relay.run(RequestKind::PageContent).await,
        RelayResponse::Summary("- crabs molt".into())
    );
    let posted = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path() == GENERATE_PATH)
        .unwrap();
    let prompt = prompt_of(&posted);
    assert!(prompt.contains("Crabs molt."));
    assert!(!prompt.contains("var x"));
    host.close().await;
}

#[tokio::test]
async fn html_output_escapes_the_model_answer() {
    let server = MockServer::start().await;
    mount_gemini(&server, "- use <b> tags & more\n- second").await;

    let cfg = config_for(&server, "");
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::with_key("AIza-e2e"));
    let tabs = StaticTabHost::inline(
        "https://example.com",
        "<body><p>Markup lesson</p></body>",
        content_script(&cfg),
    );
    let relay = build_relay(&cfg, keys, Arc::new(tabs)).unwrap();

    let RelayResponse::Summary(summary) = relay.run(RequestKind::PageContent).await else {
        panic!("expected a summary");
    };
    assert_eq!(
        render_summary(&summary, true),
        "- use &lt;b&gt; tags &amp; more<br>- second"
    );
    assert_eq!(render_summary(&summary, false), summary);
}
