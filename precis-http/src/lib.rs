//! Minimal HTTP client with safe logging and query-param auth.
//!
//! - Request options: `Auth`, timeout, absolute URLs
//! - Redacts sensitive query params and never logs secret values
//! - One attempt per call: callers see the first failure, nothing is retried
//! - Optional *raw* request/response logging via `PRECIS_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), precis_http::HttpError> {
//! let client = precis_http::HttpClient::new("https://api.example.com")?;
//! let page = client
//!     .get_text("articles/1", precis_http::RequestOpts::default())
//!     .await?;
//! # let _ = page;
//! # Ok(()) }
//! ```
//!
//! Security: logs only ever include the auth kind (query/none), and secret
//! query params are redacted before they are printed.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::StatusCode;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "PRECIS_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "apikey",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_key(k: &str) -> bool {
    SECRET_QUERY_KEYS.contains(&k.to_ascii_lowercase().as_str())
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let v = val.to_str().unwrap_or("");
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                s.truncate(floor_char_boundary(&s, RAW_MAX_BODY));
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{}'", redacted_url(url)));
    parts.join(" ")
}

fn redacted_url(url: &Url) -> String {
    let mut out = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_key(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return out.to_string();
    }
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out.to_string()
}

/// Redact sensitive headers for logging.
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "Bearer <redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use precis_http::Auth;
/// use std::borrow::Cow;
///
/// let key = Auth::Query { name: "key", value: Cow::Borrowed("AIza...") };
/// if let Auth::Query { name, .. } = key {
///     assert_eq!(name, "key");
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Auth via query param (Gemini: `?key=`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use precis_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// Status, headers and body of a completed exchange.
struct Exchange {
    req_id: String,
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing slash is added to the base so relative paths extend it
    /// instead of replacing its last segment.
    ///
    /// ```no_run
    /// use precis_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://generativelanguage.googleapis.com/v1beta")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(60));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let normalized = if base.ends_with('/') {
            Cow::Borrowed(base)
        } else {
            Cow::Owned(format!("{base}/"))
        };
        let base = Url::parse(&normalized).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(60),
        })
    }

    /// POST JSON with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let ex = self.execute(Method::POST, path, Some(bytes), &opts).await?;
        decode_json(ex)
    }

    /// GET a text body (HTML pages, XML caption documents).
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let ex = self.execute(Method::GET, path, None, &opts).await?;
        String::from_utf8(ex.bytes).map_err(|e| {
            tracing::warn!(req_id=%ex.req_id, error=%e, "http.response.not_utf8");
            HttpError::Decode(e.to_string(), String::new())
        })
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute && let Ok(abs) = Url::parse(path) {
            return Ok(abs);
        }
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        opts: &RequestOpts<'_>,
    ) -> Result<Exchange, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;

        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        rb = rb.timeout(timeout);

        let mut query: Vec<(&str, &str)> = Vec::new();

        let mut sent_headers = HeaderMap::new();
        if let Some(bytes) = &body {
            sent_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            rb = rb.headers(sent_headers.clone()).body(bytes.clone());
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Query { name, value }) => {
                query.push((*name, value.as_ref()));
                "query"
            }
            Some(Auth::None) | None => "none",
        };

        if !query.is_empty() {
            rb = rb.query(&query);
        }

        let redacted_q: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_key(k) { "<redacted>" } else { v };
                ((*k).to_string(), shown.to_string())
            })
            .collect();

        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let mut shown = url.clone();
            if !query.is_empty() {
                shown.query_pairs_mut().extend_pairs(query.iter());
            }
            let curl = make_curl(&method, &shown, &sent_headers, body.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = describe_send_error(&err);
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-goog-request-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let cap = bytes.len().min(RAW_MAX_BODY);
            let text = String::from_utf8_lossy(&bytes[..cap]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated=bytes.len() > RAW_MAX_BODY
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return Ok(Exchange {
                req_id,
                status,
                headers,
                bytes: bytes.to_vec(),
            });
        }

        let message = extract_error_message(&bytes)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%req_hdr_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: req_hdr_id,
        })
    }
}

fn decode_json<T: DeserializeOwned>(ex: Exchange) -> Result<T, HttpError> {
    let content_type = ex
        .headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    serde_json::from_slice::<T>(&ex.bytes).map_err(|e| {
        let snippet = snip_body(&ex.bytes);
        tracing::warn!(
            req_id=%ex.req_id,
            status=%ex.status,
            content_type,
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e.to_string(),
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

// ==============================
// Helpers
// ==============================

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// Pull a human message out of the common JSON error envelopes.
fn extract_error_message(body: &[u8]) -> Option<String> {
    // Google/OpenAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body)
        && !env.error.message.is_empty()
    {
        return Some(env.error.message);
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }
    None
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(floor_char_boundary(&snip, 500));
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn google_error_envelope_message() {
        let body = br#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("API key not valid.")
        );
    }

    #[test]
    fn flat_error_message() {
        assert_eq!(
            extract_error_message(br#"{"detail":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(extract_error_message(b"<html>502</html>"), None);
    }

    #[test]
    fn curl_redacts_query_key() {
        let url = Url::parse("https://example.com/v1/models/x:generateContent?key=AIza123&alt=json")
            .unwrap();
        let curl = make_curl(&Method::POST, &url, &HeaderMap::new(), Some(b"{}"));
        assert!(!curl.contains("AIza123"));
        assert!(curl.contains("alt=json"));
    }

    #[test]
    fn snip_respects_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("https://example.com/v1beta").unwrap();
        let url = client.resolve("models/m:generateContent", false).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1beta/models/m:generateContent");
    }

    #[tokio::test]
    async fn posts_json_with_query_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(query_param("key", "k-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&format!("{}/v1", server.uri())).unwrap();
        let got: serde_json::Value = client
            .post_json_opts(
                "echo",
                &json!({ "ping": 1 }),
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "key",
                        value: Cow::Borrowed("k-1"),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(got, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn non_success_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "error": { "message": "overloaded" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_text("flaky", RequestOpts::default())
            .await
            .unwrap_err();
        match err {
            HttpError::Api { status, message, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn absolute_path_bypasses_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<transcript/>"))
            .mount(&server)
            .await;

        let client = HttpClient::new("https://unused.invalid").unwrap();
        let body = client
            .get_text(
                &format!("{}/api/timedtext?v=abc", server.uri()),
                RequestOpts {
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(body, "<transcript/>");
    }
}
