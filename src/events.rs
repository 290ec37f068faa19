use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, info, warn};

/// Progress and failure narration, keyed by phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CrawlStart { base_url: String },
    ScrollTick { height: i64 },
    LinkFound { url: String },
    CrawlDone { post_count: usize },
    CrawlFailed { reason: String },
    NoPostsFound,
    ExtractStart { url: String },
    ExtractFailed { url: String, reason: String },
    FileWritten { url: String, path: PathBuf },
}

impl Event {
    /// Stable key used as the `phase` field in logs.
    pub fn phase(&self) -> &'static str {
        match self {
            Event::CrawlStart { .. } => "crawl-start",
            Event::ScrollTick { .. } => "scroll-tick",
            Event::LinkFound { .. } => "link-found",
            Event::CrawlDone { .. } => "crawl-done",
            Event::CrawlFailed { .. } => "crawl-failed",
            Event::NoPostsFound => "no-posts",
            Event::ExtractStart { .. } => "extract-start",
            Event::ExtractFailed { .. } => "extract-failed",
            Event::FileWritten { .. } => "file-written",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CrawlStart { base_url } => write!(f, "Fetching page: {}", base_url),
            Event::ScrollTick { height } => write!(f, "Scrolled to height: {}", height),
            Event::LinkFound { url } => write!(f, "Found post URL: {}", url),
            Event::CrawlDone { post_count } => write!(f, "Found {} blog posts", post_count),
            Event::CrawlFailed { reason } => write!(f, "Error crawling blog URLs: {}", reason),
            Event::NoPostsFound => write!(f, "No blog URLs found"),
            Event::ExtractStart { url } => write!(f, "Processing {}", url),
            Event::ExtractFailed { url, reason } => {
                write!(f, "Error extracting content from {}: {}", url, reason)
            }
            Event::FileWritten { url, path } => write!(f, "Saved {} to {}", url, path.display()),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Default sink: every event becomes a `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        let phase = event.phase();
        match event {
            Event::CrawlFailed { .. } | Event::ExtractFailed { .. } => {
                warn!(phase = phase, "{}", event)
            }
            Event::ScrollTick { .. } | Event::LinkFound { .. } => debug!(phase = phase, "{}", event),
            _ => info!(phase = phase, "{}", event),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn phases(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::phase).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
