use anyhow::Result;
use async_trait::async_trait;

/// The page itself could not be reached, as opposed to holding nothing
/// useful. Implementations wrap it in the `anyhow::Error` they return.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("page session failed: {0}")]
    Session(String),
}

/// What a content script can see of the page it runs in.
#[async_trait]
pub trait PageDom: Send + Sync {
    /// Rendered text of `<body>`, as a reader would see it.
    async fn body_text(&self) -> Result<String>;

    /// Text content of every element matching the CSS `selector`, in
    /// document order. No match yields an empty vec.
    async fn select_texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Raw HTML of the document.
    async fn html_source(&self) -> Result<String>;
}
