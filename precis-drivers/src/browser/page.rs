use crate::dom::{DomError, PageDom};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::Client;
use serde_json::Value;

const BODY_TEXT_JS: &str = "return document.body ? document.body.innerText : '';";

const SELECT_TEXTS_JS: &str = r#"
const nodes = document.querySelectorAll(arguments[0]);
return Array.from(nodes, (n) => n.textContent || '');
"#;

/// [`PageDom`] over a live browser tab.
///
/// Every call runs a fresh script in the page; nothing is cached between
/// calls, so the view always reflects the current document.
#[derive(Clone)]
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn session_error(err: CmdError) -> anyhow::Error {
    DomError::Session(err.to_string()).into()
}

#[async_trait]
impl PageDom for WebDriverPage {
    async fn body_text(&self) -> Result<String> {
        let v = self
            .client
            .execute(BODY_TEXT_JS, vec![])
            .await
            .map_err(session_error)?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn select_texts(&self, selector: &str) -> Result<Vec<String>> {
        let v = self
            .client
            .execute(SELECT_TEXTS_JS, vec![Value::String(selector.to_string())])
            .await
            .map_err(session_error)?;
        match v {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|item| item.as_str().unwrap_or_default().to_string())
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(anyhow!("unexpected selector result: {other}")),
        }
    }

    async fn html_source(&self) -> Result<String> {
        self.client.source().await.map_err(session_error)
    }
}
