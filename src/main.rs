use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use regex::Regex;
use tracing::info;

use blog_scraper::crawler::ScrollCrawler;
use blog_scraper::extract::ContentExtractor;
use blog_scraper::{
    build_http_client, process_posts, CrawlSettings, TracingSink, DEFAULT_BASE_URL,
    DEFAULT_OUTPUT_DIR,
};

#[derive(Parser, Debug)]
#[command(name = "blog-scraper", about = "Crawl an infinite-scroll blog index and save every post as markdown")]
struct Cli {
    /// Blog index page to crawl
    #[arg(long, env = "BLOG_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory the markdown files are written to
    #[arg(short, long, env = "BLOG_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: String,

    /// Regex a link must match to count as a post (default: contains /blog/)
    #[arg(short, long, env = "BLOG_POST_PATTERN")]
    pattern: Option<String>,

    /// Wait after each scroll, in milliseconds
    #[arg(long, env = "BLOG_SETTLE_MS", default_value = "2000")]
    settle_ms: u64,

    /// Give up scrolling after this many scrolls
    #[arg(long, env = "BLOG_MAX_SCROLLS")]
    max_scrolls: Option<usize>,

    /// Per-request timeout for post fetches, in seconds
    #[arg(long, env = "BLOG_HTTP_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "BLOG_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut settings = CrawlSettings::new(&cli.base_url)
        .with_settle_delay(Duration::from_millis(cli.settle_ms));
    if let Some(pattern) = &cli.pattern {
        let re = Regex::new(pattern).with_context(|| format!("Invalid post pattern '{}'", pattern))?;
        settings = settings.with_pattern(re);
    }
    if let Some(max) = cli.max_scrolls {
        settings = settings.with_max_scrolls(max);
    }

    info!("Base URL: {}", cli.base_url);
    info!("Output directory: {}", cli.output_dir);

    let sink = TracingSink;
    let urls = ScrollCrawler::new(settings, &sink).crawl_with_chrome().await;

    let client = build_http_client(Duration::from_secs(cli.timeout_secs))?;
    let extractor = ContentExtractor::new(client);
    let summary = process_posts(urls, &extractor, &cli.output_dir, &sink).await;

    info!(
        "Done: {} discovered, {} written, {} failed",
        summary.discovered, summary.written, summary.failed
    );
    Ok(())
}
