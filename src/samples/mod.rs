//! Sample test acquisition
//!
//! This module provides everything needed to turn a problem locator into
//! its published sample tests:
//! - `SampleCache`: time-bounded store of fetched sample sets
//! - `SampleFetcher`: cache-first, single-flight fetch path
//! - `SampleScraper`: the headless-browser capability behind the fetcher
//!
//! The cache is owned by the fetcher; nothing else reads or writes it.

pub mod cache;
pub mod fetcher;
pub mod parse;
pub mod scraper;

use serde::{Deserialize, Serialize};

use crate::common::SampleError;

pub use cache::SampleCache;
pub use fetcher::SampleFetcher;
pub use scraper::{HeadlessChromeScraper, SampleScraper};

/// Index-aligned sample inputs and expected outputs for one problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSet {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl SampleSet {
    /// Build a sample set; zero pairs or misaligned sequences are rejected
    pub fn new(
        inputs: Vec<String>,
        outputs: Vec<String>,
        url: &str,
    ) -> Result<Self, SampleError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(SampleError::NoSamplesFound(url.to_string()));
        }
        if inputs.len() != outputs.len() {
            return Err(SampleError::Scrape(format!(
                "found {} sample inputs but {} outputs at {}",
                inputs.len(),
                outputs.len(),
                url
            )));
        }
        Ok(Self { inputs, outputs })
    }

    #[cfg(test)]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[cfg(test)]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// All inputs as one stream, in sample order
    pub fn joined_input(&self) -> String {
        self.inputs.join("\n")
    }

    /// All expected outputs as one blob, in sample order
    pub fn joined_output(&self) -> String {
        self.outputs.join("\n")
    }
}
