use precis_common::{PrecisError, Result};
use precis_http::{HttpClient, HttpError, RequestOpts};
use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::Html;
use std::borrow::Cow;
use std::time::Duration;

/// Origin that relative caption URLs resolve against.
pub const YOUTUBE_ORIGIN: &str = "https://www.youtube.com";

/// Fetches a timed-text caption document and flattens it to plain text.
#[derive(Clone)]
pub struct CaptionFetcher {
    http: HttpClient,
    timeout: Duration,
}

impl CaptionFetcher {
    /// ```
    /// use precis_web::captions::{CaptionFetcher, YOUTUBE_ORIGIN};
    /// use std::time::Duration;
    ///
    /// let fetcher = CaptionFetcher::new(YOUTUBE_ORIGIN, Duration::from_secs(60)).unwrap();
    /// # let _ = fetcher;
    /// ```
    pub fn new(origin: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(origin)
            .map_err(|e| PrecisError::Configuration(format!("Invalid caption origin: {e}")))?;
        Ok(Self { http, timeout })
    }

    /// GET `url` and return its caption text. Blank when the document has
    /// no `<text>` nodes.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let opts = RequestOpts {
            timeout: Some(self.timeout),
            allow_absolute: true,
            ..Default::default()
        };
        let xml = self.http.get_text(url, opts).await.map_err(|e| match e {
            HttpError::Api { status, .. } => {
                PrecisError::Transport(format!("Failed to fetch captions (HTTP {status})."))
            }
            other => PrecisError::Transport(format!("Failed to fetch captions: {other}")),
        })?;
        let text = caption_text(&xml)?;
        tracing::debug!(xml_len = xml.len(), text_chars = text.chars().count(), "web.captions.fetched");
        Ok(text)
    }
}

/// Text of every `<text>` node, each followed by a space, trimmed.
///
/// Nodes are XML-unescaped and then HTML-entity-decoded, because timed-text
/// documents escape entities twice (`&amp;#39;`).
pub fn caption_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut out = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                in_text = false;
                out.push(' ');
            }
            Ok(Event::Text(e)) if in_text => {
                let raw = match e.unescape() {
                    Ok(t) => t,
                    Err(_) => Cow::Owned(String::from_utf8_lossy(&e).into_owned()),
                };
                out.push_str(&decode_html_entities(&raw));
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(position = reader.buffer_position(), error = %err, "web.captions.parse_error");
                return Err(PrecisError::Extraction(
                    "The captions document could not be read.".to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim().to_string())
}

fn decode_html_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let fragment = Html::parse_fragment(s);
    Cow::Owned(fragment.root_element().text().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_nodes() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="1.2">Hello</text>
<text start="1.7" dur="2">world</text>
</transcript>"#;
        assert_eq!(caption_text(xml).unwrap(), "Hello world");
    }

    #[test]
    fn decodes_double_escaped_entities() {
        let xml = r#"<transcript><text start="0">it&amp;#39;s Tom &amp;amp; Jerry</text></transcript>"#;
        assert_eq!(caption_text(xml).unwrap(), "it's Tom & Jerry");
    }

    #[test]
    fn ignores_text_outside_text_nodes() {
        let xml = "<transcript>noise<text>kept</text></transcript>";
        assert_eq!(caption_text(xml).unwrap(), "kept");
    }

    #[test]
    fn empty_document_is_blank() {
        assert_eq!(caption_text("<transcript></transcript>").unwrap(), "");
    }

    #[test]
    fn malformed_document_is_extraction_error() {
        let err = caption_text("<transcript><text>a</b></transcript>").unwrap_err();
        assert!(matches!(err, PrecisError::Extraction(_)));
    }
}
