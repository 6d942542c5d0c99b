//! HTTP delivery to a single robot webhook.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::config::NotifierSettings;
use crate::error::{ConfigurationError, DeliveryError};
use crate::payload::RobotPayload;
use crate::urls::redact;

/// User agent sent with every webhook request.
pub const USER_AGENT: &str = concat!("wechat-notify/", env!("CARGO_PKG_VERSION"));

/// Posts robot payloads to webhook URLs.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    /// Build a client honoring the timeout and TLS settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::HttpClient`] if the TLS backend cannot
    /// be initialized.
    pub fn new(settings: &NotifierSettings) -> Result<Self, ConfigurationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(ConfigurationError::HttpClient)?;

        Ok(Self { client })
    }

    /// Send one payload. The response body is not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] on connection failure, timeout, or a
    /// non-2xx status.
    pub async fn post(&self, url: &str, payload: &RobotPayload) -> Result<(), DeliveryError> {
        let target = redact(url);
        debug!(url = %target, "Posting alert to webhook");

        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(url = %target, status = %status, "Webhook accepted alert");
            Ok(())
        } else {
            warn!(url = %target, status = %status, "Webhook request failed");
            Err(DeliveryError::Status(status))
        }
    }
}
