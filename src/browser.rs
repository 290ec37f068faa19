//! Headless browser capability used by the scroll crawler.
//!
//! The crawler only needs five operations, so they live behind the
//! [`Browser`] trait. [`ChromeBrowser`] drives a real headless Chrome over
//! the DevTools protocol; tests substitute a scripted fake.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_HEIGHT: &str = "document.body.scrollHeight";

#[async_trait]
pub trait Browser: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn scroll_to_bottom(&mut self) -> Result<()>;
    async fn current_height(&mut self) -> Result<i64>;
    async fn page_source(&mut self) -> Result<String>;
    /// Release the session. Called exactly once per crawl, on every path.
    async fn close(&mut self) -> Result<()>;
}

/// Headless Chrome session with a single page.
pub struct ChromeBrowser {
    browser: CdpBrowser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromeBrowser {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| anyhow!("Invalid browser config: {}", e))?;
        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .context("Failed to launch headless Chrome")?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Launched headless Chrome");
        Ok(Self { browser, handler, page: None })
    }

    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("No page open; navigate first"))
    }

    async fn eval_height(page: &Page) -> Result<i64> {
        let height: f64 = page
            .evaluate(SCROLL_HEIGHT)
            .await
            .context("Failed to read document height")?
            .into_value()
            .context("Document height was not a number")?;
        Ok(height as i64)
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        page.wait_for_navigation()
            .await
            .with_context(|| format!("Navigation to {} did not finish", url))?;
        self.page = Some(page);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .context("Failed to scroll")?;
        Ok(())
    }

    async fn current_height(&mut self) -> Result<i64> {
        Self::eval_height(self.page()?).await
    }

    async fn page_source(&mut self) -> Result<String> {
        self.page()?.content().await.context("Failed to read page source")
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        let closed = self.browser.close().await.map(|_| ());
        // Reap the child process even when the close command failed.
        let waited = self.browser.wait().await.map(|_| ());
        self.handler.abort();
        debug!("Headless Chrome closed");
        closed.context("Failed to close browser")?;
        waited.context("Failed to wait for browser exit")?;
        Ok(())
    }
}
