//! Prompt templates, one per request kind and payload shape.
use precis_common::{ExtractedPayload, RequestKind};

/// Cut `text` to at most `max_chars` characters, never inside a character.
///
/// ```
/// use precis_llm::prompt::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Render the prompt for `payload`. Text is cut to `max_source_chars` first.
pub fn render(payload: &ExtractedPayload, kind: RequestKind, max_source_chars: usize) -> String {
    match payload {
        ExtractedPayload::Text(text) => {
            let source = truncate_chars(text, max_source_chars);
            match kind {
                RequestKind::PageContent => format!(
                    "Provide a concise and structured summary of the following web page content. \
                     Start with a brief introductory sentence, then list the 3 to 5 most important \
                     points as a bulleted list.\n\nContent:\n{source}"
                ),
                RequestKind::VideoTranscript => format!(
                    "Summarize the following YouTube video transcript. \
                     Highlight the key points as a bulleted list.\n\nTranscript:\n{source}"
                ),
            }
        }
        ExtractedPayload::Url(url) => match kind {
            RequestKind::PageContent => format!(
                "Provide a concise and structured summary of the content found at this URL: {url}. \
                 Start with a brief introductory sentence, then list the 3 to 5 most important \
                 points as a bulleted list."
            ),
            RequestKind::VideoTranscript => format!(
                "Summarize the YouTube video at this URL: {url}. Your summary should be based on \
                 the video's spoken content (transcript). Highlight the key points as a bulleted list."
            ),
        },
    }
}
