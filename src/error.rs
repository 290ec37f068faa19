use std::path::PathBuf;

/// Failures surfaced by the scraper. Per-post failures are recovered by the
/// caller; none of them abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Network-level failure while fetching a page.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Browser automation failed somewhere between launch and teardown.
    #[error("crawl failed: {0}")]
    Crawl(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    /// True for the fetch class of errors (network, status, bad URL), which
    /// callers treat as "no content" for a single post.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            ScrapeError::Fetch { .. } | ScrapeError::HttpStatus { .. } | ScrapeError::InvalidUrl { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
