//! What the popup panel shows, independent of any terminal.
use precis_common::protocol::RelayResponse;

pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Visible state of the result panel. At most one of loading, error and
/// summary is shown at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    Hidden,
    Loading,
    Error(String),
    Summary(String),
}

impl Panel {
    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }
}

impl From<RelayResponse> for Panel {
    fn from(response: RelayResponse) -> Self {
        match response {
            RelayResponse::Summary(text) if text.trim().is_empty() => {
                Panel::Error(UNKNOWN_ERROR.to_string())
            }
            RelayResponse::Summary(text) => Panel::Summary(text),
            RelayResponse::Error(message) => Panel::Error(message),
        }
    }
}

/// Summary text split on line breaks, one entry per rendered line.
///
/// ```
/// use precis_tui::presentation::summary_lines;
///
/// assert_eq!(summary_lines("- a\r\n- b"), vec!["- a", "- b"]);
/// ```
pub fn summary_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Summary as an HTML fragment: markup characters escaped, line breaks as `<br>`.
pub fn summary_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}
