//! Summarizer client for Precis.
//!
//! This crate exposes the [`traits::Summarizer`] interface and the Gemini
//! implementation behind it. [`build_summarizer`] wires a client from the
//! loaded [`precis_config::PrecisConfig`].
//!
//! # Examples
//! ```no_run
//! use precis_common::{Credential, ExtractedPayload, RequestKind, Result};
//! use precis_config::PrecisConfigLoader;
//! use precis_llm::build_summarizer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = PrecisConfigLoader::new().load().expect("defaults");
//! let summarizer = build_summarizer(&cfg)?;
//! let text = summarizer
//!     .summarize(
//!         ExtractedPayload::Text("Rust is a systems language.".into()),
//!         &Credential::new("AIza..."),
//!         RequestKind::PageContent,
//!     )
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod prompt;
pub mod traits;

use gemini::GeminiClient;
use precis_common::Result;
use precis_config::PrecisConfig;
use std::sync::Arc;
use std::time::Duration;
use traits::Summarizer;

pub use precis_config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Build the configured summarizer.
pub fn build_summarizer(config: &PrecisConfig) -> Result<Arc<dyn Summarizer>> {
    let client = GeminiClient::new(&config.model.endpoint, config.model.name.clone())?
        .with_timeout(Duration::from_secs(config.model.timeout_secs))
        .with_max_source_chars(config.pipeline.max_source_chars);
    tracing::debug!(
        model = %client.model_name(),
        endpoint = %config.model.endpoint,
        max_source_chars = config.pipeline.max_source_chars,
        "llm.summarizer.ready"
    );
    Ok(Arc::new(client))
}
