//! Error taxonomy
//!
//! Each layer returns its own tagged error. The CLI boundary is the only
//! place where they are turned into a user notification.

use thiserror::Error;

/// Failure to find a problem reference in a source document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("problem URL not found in the source file")]
    NotFound,
    #[error("invalid problem URL: {0} is not a supported contest site")]
    InvalidDomain(String),
}

/// Failure to obtain sample tests for a problem
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to fetch the problem: {0}")]
    Scrape(String),
    #[error("no sample tests found at {0}")]
    NoSamplesFound(String),
}

/// Failure to map a source file to a toolchain
#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("invalid language configuration: {0}")]
    Config(String),
}

/// Any failure that stops a run before a report can be produced
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error(transparent)]
    Samples(#[from] SampleError),
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("execution failed: {0:#}")]
    Execution(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LocatorError::NotFound.to_string(),
            "problem URL not found in the source file"
        );
        assert_eq!(
            LanguageError::Unsupported("rb".into()).to_string(),
            "unsupported file type: rb"
        );
        let err: PipelineError = SampleError::NoSamplesFound("u".into()).into();
        assert_eq!(err.to_string(), "no sample tests found at u");
    }
}
