use std::time::Duration;

use regex::Regex;
use scraper::ElementRef;

pub const DEFAULT_BASE_URL: &str = "https://semgrep.dev/blog/";
pub const DEFAULT_OUTPUT_DIR: &str = "blog_posts";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Path segment that marks a blog post, both for link classification and
/// for filename derivation.
pub const POST_MARKER: &str = "blog";

/// Why a node was considered as the article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    Article,
    Main,
    ClassMatch,
    ParagraphCluster,
}

/// A scored region of one parsed document. Borrows the document, so it can
/// never outlive it.
#[derive(Debug, Clone)]
pub struct ContentCandidate<'a> {
    pub origin: CandidateOrigin,
    pub node: ElementRef<'a>,
    pub estimated_size: usize,
}

/// Result of extracting one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPost {
    pub source_url: String,
    pub title: Option<String>,
    pub body: String,
}

impl ExtractedPost {
    /// Body text with a `# title` line prepended when a title is known.
    pub fn content(&self) -> String {
        match &self.title {
            Some(title) if self.body.is_empty() => format!("# {}", title),
            Some(title) => format!("# {}\n\n{}", title, self.body),
            None => self.body.clone(),
        }
    }
}

/// Knobs for one crawl of a blog index.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_url: String,
    pub pattern: Option<Regex>,
    pub settle_delay: Duration,
    pub max_scrolls: Option<usize>,
}

impl CrawlSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            pattern: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_scrolls: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_max_scrolls(mut self, max: usize) -> Self {
        self.max_scrolls = Some(max);
        self
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub written: usize,
    pub failed: usize,
}
