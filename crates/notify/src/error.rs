//! Error types for the WeChat robot notifier.

use thiserror::Error;

/// Errors raised while saving or loading notifier configuration.
///
/// These surface to the administrator at settings-save time and never
/// reach the dispatch path.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A configured webhook line is not an `http(s)://` URL
    #[error("Not a valid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built from the process settings
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors that can occur when posting an alert to a single webhook.
///
/// `notify` logs and discards these; `deliver` hands them back per URL.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Connection, TLS or timeout failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-2xx status
    #[error("Webhook returned {0}")]
    Status(reqwest::StatusCode),
}

impl DeliveryError {
    /// Whether the failure was the per-request timeout firing.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
