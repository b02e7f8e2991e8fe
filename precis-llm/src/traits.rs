use async_trait::async_trait;
use precis_common::{Credential, ExtractedPayload, RequestKind, Result};

/// Turns extracted page material into a summary.
///
/// The credential travels with each call; implementations never read a
/// key from storage themselves.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `payload` with the prompt template chosen by `kind`.
    async fn summarize(
        &self,
        payload: ExtractedPayload,
        credential: &Credential,
        kind: RequestKind,
    ) -> Result<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
