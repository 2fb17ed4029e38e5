//! Headless browser scraping
//!
//! The contest site rejects plain HTTP clients, so pages are rendered by a
//! real browser running headless. The browser process is the whole session:
//! it is launched per fetch and always torn down before returning.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::parse::parse_samples;
use super::SampleSet;
use crate::common::SampleError;

/// Capability that turns a problem URL into its sample tests
#[async_trait]
pub trait SampleScraper: Send + Sync {
    async fn fetch_sample_pairs(&self, url: &str) -> Result<SampleSet, SampleError>;
}

/// Scraper backed by a Chromium-family browser in `--dump-dom` mode
pub struct HeadlessChromeScraper {
    /// Browser executable
    browser: String,
    /// Client identity string sent with every request
    user_agent: String,
    /// Deadline for navigation and DOM serialization
    navigation_timeout: Duration,
}

impl HeadlessChromeScraper {
    pub fn new(
        browser: impl Into<String>,
        user_agent: impl Into<String>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            browser: browser.into(),
            user_agent: user_agent.into(),
            navigation_timeout,
        }
    }

    fn browser_args(&self, url: &str) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            format!("--user-agent={}", self.user_agent),
            "--dump-dom".to_string(),
            url.to_string(),
        ]
    }

    /// Render `url` and return the serialized DOM once the document has parsed
    async fn render(&self, url: &str) -> Result<String, SampleError> {
        let args = self.browser_args(url);
        debug!("Launching {} with args: {:?}", self.browser, args);

        let child = Command::new(&self.browser)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SampleError::Scrape(format!("failed to launch {}: {}", self.browser, e)))?;

        // Dropping the wait future on deadline drops the child, which kills it
        let output = tokio::time::timeout(self.navigation_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SampleError::Scrape(format!(
                    "navigation to {} timed out after {}ms",
                    url,
                    self.navigation_timeout.as_millis()
                ))
            })?
            .map_err(|e| SampleError::Scrape(format!("browser session failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SampleError::Scrape(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let dom = String::from_utf8_lossy(&output.stdout).to_string();
        if dom.trim().is_empty() {
            return Err(SampleError::Scrape(format!("empty document for {}", url)));
        }
        Ok(dom)
    }
}

#[async_trait]
impl SampleScraper for HeadlessChromeScraper {
    async fn fetch_sample_pairs(&self, url: &str) -> Result<SampleSet, SampleError> {
        info!("Fetching sample tests from {}", url);
        let dom = self.render(url).await?;
        let samples = parse_samples(&dom, url)?;
        info!("Extracted {} sample test(s) from {}", samples.len(), url);
        Ok(samples)
    }
}
