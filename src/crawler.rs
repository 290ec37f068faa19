use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{Browser, ChromeBrowser};
use crate::error::ScrapeError;
use crate::events::{Event, EventSink};
use crate::types::{CrawlSettings, POST_MARKER};

/// Where the scroll loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollState {
    Loading,
    Scrolling { last_height: i64, scrolls: usize },
    Done,
}

/// Discovers post URLs on an infinite-scroll blog index.
pub struct ScrollCrawler<'a> {
    settings: CrawlSettings,
    sink: &'a dyn EventSink,
}

impl<'a> ScrollCrawler<'a> {
    pub fn new(settings: CrawlSettings, sink: &'a dyn EventSink) -> Self {
        Self { settings, sink }
    }

    /// Launch headless Chrome and crawl with it.
    pub async fn crawl_with_chrome(&self) -> HashSet<String> {
        self.sink.emit(&Event::CrawlStart { base_url: self.settings.base_url.clone() });
        match ChromeBrowser::launch().await {
            Ok(browser) => self.run(browser).await,
            Err(e) => self.fail(ScrapeError::Crawl(format!("{:#}", e))),
        }
    }

    /// Crawl using an already acquired browser session. The session is
    /// closed before this returns, whatever the outcome.
    pub async fn crawl<B: Browser>(&self, browser: B) -> HashSet<String> {
        self.sink.emit(&Event::CrawlStart { base_url: self.settings.base_url.clone() });
        self.run(browser).await
    }

    async fn run<B: Browser>(&self, mut browser: B) -> HashSet<String> {
        let outcome = self.scroll_until_settled(&mut browser).await;
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser cleanly: {:#}", e);
        }

        let harvested = outcome.and_then(|source| {
            let base = Url::parse(&self.settings.base_url)
                .with_context(|| format!("Invalid base URL '{}'", self.settings.base_url))?;
            Ok(harvest_links(&source, &base, self.settings.pattern.as_ref()))
        });

        match harvested {
            Ok(urls) => {
                for url in &urls {
                    self.sink.emit(&Event::LinkFound { url: url.clone() });
                }
                self.sink.emit(&Event::CrawlDone { post_count: urls.len() });
                urls
            }
            Err(e) => self.fail(ScrapeError::Crawl(format!("{:#}", e))),
        }
    }

    fn fail(&self, error: ScrapeError) -> HashSet<String> {
        self.sink.emit(&Event::CrawlFailed { reason: error.to_string() });
        HashSet::new()
    }

    /// Drive the page until scrolling no longer grows it, then return the
    /// rendered source.
    async fn scroll_until_settled<B: Browser>(&self, browser: &mut B) -> Result<String> {
        let mut state = ScrollState::Loading;
        loop {
            state = match state {
                ScrollState::Loading => {
                    browser.navigate(&self.settings.base_url).await?;
                    let height = browser.current_height().await?;
                    debug!("Initial height: {}", height);
                    ScrollState::Scrolling { last_height: height, scrolls: 0 }
                }
                ScrollState::Scrolling { last_height, scrolls } => {
                    if self.settings.max_scrolls.is_some_and(|max| scrolls >= max) {
                        warn!("Stopped after {} scrolls; page may still be growing", scrolls);
                        ScrollState::Done
                    } else {
                        browser.scroll_to_bottom().await?;
                        tokio::time::sleep(self.settings.settle_delay).await;
                        let height = browser.current_height().await?;
                        self.sink.emit(&Event::ScrollTick { height });
                        if height == last_height {
                            ScrollState::Done
                        } else {
                            ScrollState::Scrolling { last_height: height, scrolls: scrolls + 1 }
                        }
                    }
                }
                ScrollState::Done => {
                    info!("Page settled, capturing source");
                    return browser.page_source().await;
                }
            };
        }
    }
}

/// Collect every anchor on the page that looks like a post.
pub fn harvest_links(html: &str, base: &Url, pattern: Option<&Regex>) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut urls = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = canonicalize(href, base) else {
                continue;
            };
            if is_post_url(&url, base.as_str(), pattern) {
                urls.insert(url);
            }
        }
    }

    urls
}

/// Turn an href into an absolute, scheme-qualified URL. Anything that is
/// not absolute gets the base URL's scheme and host prefixed.
pub fn canonicalize(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:"].iter().any(|p| lower.starts_with(p))
    {
        return None;
    }

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("//") {
        return Some(format!("{}:{}", base.scheme(), href));
    }

    let origin = base.origin().ascii_serialization();
    if href.starts_with('/') {
        Some(format!("{}{}", origin, href))
    } else {
        Some(format!("{}/{}", origin, href))
    }
}

/// With a pattern, a post is whatever the pattern matches. Without one, a
/// post carries the `/blog/` marker and is not the index page itself.
pub fn is_post_url(url: &str, base_url: &str, pattern: Option<&Regex>) -> bool {
    match pattern {
        Some(re) => re.is_match(url),
        None => url.contains(&format!("/{}/", POST_MARKER)) && url != base_url,
    }
}
