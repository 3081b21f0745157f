//! Posting-description retrieval.

use std::sync::Arc;

use html_escape::decode_html_entities;
use scraper::{Html, Node};
use tokio::sync::Semaphore;
use url::Url;

/// Fetches posting pages and extracts their readable text, limiting
/// concurrent HTTP requests with a [`Semaphore`].
pub struct DescriptionFetcher {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl DescriptionFetcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            semaphore: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Retrieves `url` and strips its markup. `None` on any fetch failure;
    /// the caller degrades to an empty description.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(error) => {
                log::warn!("Skipping invalid listing URL {url}: {error}");
                return None;
            }
        };
        let _permit = self.semaphore.acquire().await.ok()?;
        let res = self.client.get(url.clone()).send().await.ok()?;
        if !res.status().is_success() {
            log::warn!("Failed to get URL {}: {}", url, res.status());
            return None;
        }
        let body = res.text().await.ok()?;
        Some(extract_text(&body))
    }
}

/// Extracts the visible text of an HTML document: script, style and noscript
/// content is dropped, lines are trimmed, and blank lines removed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_markup = node.parent().is_some_and(|parent| match parent.value() {
            Node::Element(element) => {
                matches!(element.name(), "script" | "style" | "noscript")
            }
            _ => false,
        });
        if !in_markup {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    // The parser decodes entities once; double-encoded ones survive it.
    let decoded = decode_html_entities(&raw);

    decoded
        .lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_content() {
        let html = r#"<html><head><style>body { color: red; }</style></head>
            <body><h1>Staff Engineer</h1>
            <script>track("visit");</script>
            <p>Remote position.</p></body></html>"#;

        let text = extract_text(html);
        assert!(text.contains("Staff Engineer"));
        assert!(text.contains("Remote position."));
        assert!(!text.contains("track"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn drops_blank_lines_and_trims() {
        let html = "<body><p>  one  </p>\n\n<p></p><p>two</p></body>";
        assert_eq!(extract_text(html), "one\ntwo");
    }

    #[test]
    fn decodes_double_encoded_entities() {
        let html = "<body><p>Pay &amp;amp; benefits</p></body>";
        assert_eq!(extract_text(html), "Pay & benefits");
    }
}
