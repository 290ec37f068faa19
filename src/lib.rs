pub mod browser;
pub mod crawler;
pub mod error;
pub mod events;
pub mod extract;
pub mod normalize;
pub mod persist;
pub mod scoring;
pub mod types;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

pub use error::ScrapeError;
pub use events::{Event, EventSink, RecordingSink, TracingSink};
pub use types::*;

use crate::extract::ContentExtractor;
use crate::persist::PostWriter;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")
}

/// Extract every discovered URL in turn and write what comes back. A post
/// that fails to fetch or to save is counted and skipped.
pub async fn process_posts(
    urls: HashSet<String>,
    extractor: &ContentExtractor,
    output_dir: impl Into<PathBuf>,
    sink: &dyn EventSink,
) -> RunSummary {
    let mut summary = RunSummary {
        discovered: urls.len(),
        ..Default::default()
    };
    if urls.is_empty() {
        sink.emit(&Event::NoPostsFound);
        return summary;
    }

    let mut urls: Vec<String> = urls.into_iter().collect();
    urls.sort();

    let mut writer = PostWriter::new(output_dir);
    for url in urls {
        let Some(post) = extractor.extract(&url, sink).await else {
            summary.failed += 1;
            continue;
        };
        match writer.save(&url, &post.content()) {
            Ok(Some(path)) => {
                sink.emit(&Event::FileWritten { url, path });
                summary.written += 1;
            }
            Ok(None) => info!("No content for {}, nothing written", url),
            Err(e) => {
                warn!("{}", e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Wrote {} of {} posts to {}",
        summary.written,
        summary.discovered,
        writer.output_dir().display()
    );
    summary
}
