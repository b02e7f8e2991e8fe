use anyhow::{Result, anyhow};
use async_trait::async_trait;
use precis_drivers::dom::PageDom;
use scraper::{ElementRef, Html, Selector};

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd",
    "table", "thead", "tbody", "tfoot", "tr", "caption", "section", "article", "header", "footer",
    "main", "nav", "aside", "blockquote", "pre", "figure", "figcaption", "form", "fieldset",
    "address", "details", "summary",
];
// Cells sharing a row stay on one line.
const CELL_TAGS: &[&str] = &["td", "th"];

/// [`PageDom`] over an HTML document held in memory.
///
/// Used for pages fetched without a browser and for fixtures.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// use precis_drivers::dom::PageDom;
/// use precis_web::page::StaticPage;
///
/// let page = StaticPage::new(
///     "<html><body><p>Hello world</p><script>var x = 1;</script></body></html>",
/// );
/// assert_eq!(page.body_text().await?, "Hello world");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

/// Visible text of `<body>`: scripts and styles are skipped, block
/// elements end a line and table cells are space separated.
pub fn visible_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    if let Ok(body) = Selector::parse("body") {
        for element in document.select(&body) {
            collect_text(&element, &mut text);
        }
    }
    clean_text(&text)
}

fn collect_text(element: &ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(el) = child.value().as_element() {
            let tag = el.name();
            if SKIP_TAGS.contains(&tag) {
                continue;
            }
            if let Some(child_ref) = ElementRef::wrap(child) {
                collect_text(&child_ref, out);
                if BLOCK_TAGS.contains(&tag) {
                    out.push('\n');
                } else if CELL_TAGS.contains(&tag) {
                    out.push(' ');
                }
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Collapse runs of whitespace and drop blank lines.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text content of every element matching `selector`.
pub fn select_texts(html: &str, selector: &str) -> Result<Vec<String>> {
    let selector =
        Selector::parse(selector).map_err(|e| anyhow!("invalid selector {selector:?}: {e}"))?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect())
}

#[async_trait]
impl PageDom for StaticPage {
    async fn body_text(&self) -> Result<String> {
        Ok(visible_body_text(&self.html))
    }

    async fn select_texts(&self, selector: &str) -> Result<Vec<String>> {
        select_texts(&self.html, selector)
    }

    async fn html_source(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_scripts_and_styles() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head>
            <body><h1>Title</h1><p>First   para</p><script>alert(1)</script>
            <noscript>enable js</noscript><div>Second</div></body></html>"#;
        assert_eq!(visible_body_text(html), "Title\nFirst para\nSecond");
    }

    #[test]
    fn layout_elements_and_cells_keep_words_apart() {
        let html = "<body><header>Top</header><main>Body</main><nav><ul><li>Home</li></ul></nav>\
            <table><tr><td>Price</td><td>10</td></tr><tr><th>Tax</th><th>2</th></tr></table>\
            <blockquote>Quote</blockquote><footer>End</footer></body>";
        assert_eq!(
            visible_body_text(html),
            "Top\nBody\nHome\nPrice 10\nTax 2\nQuote\nEnd"
        );
    }

    #[test]
    fn empty_body_is_empty_text() {
        assert_eq!(visible_body_text("<html><body></body></html>"), "");
    }

    #[test]
    fn selects_in_document_order() {
        let html = r#"<div id="segments-container">
            <div class="segment"><span class="yt-core-attributed-string"> one </span></div>
            <div class="segment"><span class="yt-core-attributed-string">two</span></div>
        </div>"#;
        let got = select_texts(
            html,
            "#segments-container .segment .yt-core-attributed-string",
        )
        .unwrap();
        assert_eq!(got, vec![" one ".to_string(), "two".to_string()]);
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(select_texts("<p></p>", "[[").is_err());
    }
}
