//! Error taxonomy for the news robot.
//!
//! Every fallible step of a run funnels into [`ScrapeError`]. The variants
//! mirror how a failure is treated by the caller:
//!
//! - [`ScrapeError::DateFormat`]: a result card carried a date in a format the
//!   site is not known to use. Fatal to the run.
//! - [`ScrapeError::ElementTimeout`]: a bounded wait expired. Fatal to the
//!   current page, which ends pagination.
//! - [`ScrapeError::Navigation`]: a page or image URL could not be loaded.
//!   Retried by [`crate::retry::RetryPolicy`] before it surfaces here.
//!
//! Reaching the date threshold is not an error and never shows up here; see
//! [`crate::extractor::Extraction::Stop`].

use crate::dates::DateFormatError;
use std::time::Duration;
use thiserror::Error;

/// The main error type for browsing, extraction and output.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A date string matched none of the known site formats.
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),

    /// A selector did not become visible within its bound.
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    ElementTimeout { selector: String, timeout: Duration },

    /// A page could not be navigated to.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A required element or attribute was absent.
    #[error("element `{selector}` not found")]
    MissingElement { selector: String },

    /// The browser or its devtools connection failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// Invalid robot configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(e.to_string())
    }
}

impl ScrapeError {
    /// Shorthand for a [`ScrapeError::MissingElement`].
    pub fn missing(selector: impl Into<String>) -> Self {
        ScrapeError::MissingElement {
            selector: selector.into(),
        }
    }

    /// Whether another attempt could succeed. Bad configuration and
    /// malformed URLs fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ScrapeError::Config(_) | ScrapeError::Url(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_selector() {
        let e = ScrapeError::ElementTimeout {
            selector: "li ps-promo".to_string(),
            timeout: Duration::from_secs(10),
        };
        let msg = e.to_string();
        assert!(msg.contains("li ps-promo"));
        assert!(msg.contains("10s"));
    }

    #[test]
    fn test_date_format_error_is_transparent() {
        let e: ScrapeError = DateFormatError::new("2024/07/18").into();
        assert_eq!(e.to_string(), "date format for '2024/07/18' not recognized");
        assert!(matches!(e, ScrapeError::DateFormat(_)));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ScrapeError::Browser("tab crashed".to_string()).is_retryable());
        assert!(ScrapeError::missing("select[name='s']").is_retryable());
        assert!(!ScrapeError::Config("bad".to_string()).is_retryable());
    }
}
