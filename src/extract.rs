use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::events::{Event, EventSink};
use crate::normalize::normalize_text;
use crate::scoring::select_content;
use crate::types::ExtractedPost;

/// User agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Nodes that never hold article prose; removed before scoring.
const NON_CONTENT_TAGS: &str = "script, style, noscript, header, footer, nav, aside, form, iframe, svg";

/// Fetches blog posts and reduces each page to its readable body.
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a random User-Agent string
    fn get_random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        let index = rng.gen_range(0..USER_AGENTS.len());
        USER_AGENTS[index]
    }

    /// Extract one post, narrating progress to `sink`. Any failure is
    /// reported as an `extract-failed` event and yields `None` so the caller
    /// can move on to the next URL.
    pub async fn extract(&self, url: &str, sink: &dyn EventSink) -> Option<ExtractedPost> {
        sink.emit(&Event::ExtractStart { url: url.to_string() });
        match self.try_extract(url).await {
            Ok(post) => Some(post),
            Err(e) => {
                sink.emit(&Event::ExtractFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    pub async fn try_extract(&self, url: &str) -> Result<ExtractedPost> {
        let html = self.fetch_html(url).await?;
        let post = extract_from_html(url, &html);
        info!(
            "Extracted {} ({} chars{})",
            url,
            post.body.chars().count(),
            if post.title.is_some() { ", titled" } else { "" }
        );
        Ok(post)
    }

    /// GET a page and return its body; non-2xx statuses are errors.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScrapeError::InvalidUrl {
                url: url.to_string(),
                reason: "URL must use HTTP or HTTPS protocol".to_string(),
            });
        }

        let response = self
            .client
            .get(parsed)
            .header("User-Agent", self.get_random_user_agent())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|source| ScrapeError::Fetch { url: url.to_string(), source })?;
        debug!("Fetched {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

/// Parse, strip, score and normalize a fetched page.
pub fn extract_from_html(url: &str, html: &str) -> ExtractedPost {
    let mut document = Html::parse_document(html);
    let title = extract_title(&document);
    strip_non_content(&mut document);
    let body = normalize_text(&select_content(&document));

    ExtractedPost {
        source_url: url.to_string(),
        title,
        body,
    }
}

/// Trimmed text of the first `<title>`, if it has any.
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?.text().collect::<String>();
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Detach script/style/header/footer/nav-like subtrees from the document.
pub fn strip_non_content(document: &mut Html) {
    let Ok(selector) = Selector::parse(NON_CONTENT_TAGS) else {
        return;
    };
    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}
