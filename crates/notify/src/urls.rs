//! Webhook URL list parsing and validation.
//!
//! The host stores the robot URLs as one text blob, one URL per line. This
//! module turns that blob into an ordered list and checks it at save time.

use url::Url;

use crate::error::ConfigurationError;

/// Schemes a webhook line must start with.
const ALLOWED_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Split a stored URL blob into its non-empty, trimmed lines.
///
/// No validation is performed here; the dispatcher uses this on the
/// already-validated stored value.
#[must_use]
pub fn split_urls(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return vec![];
    };

    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split and validate a URL blob.
///
/// Order and duplicates are preserved. Empty or absent input yields an
/// empty list, which the notifier treats as "not configured".
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidUrl`] for the first line that is not
/// an absolute `http://` or `https://` URL. Nothing is accepted in that case.
pub fn validate_urls(value: Option<&str>) -> Result<Vec<String>, ConfigurationError> {
    let urls = split_urls(value);

    if let Some(bad) = urls.iter().find(|url| !is_valid_url(url)) {
        return Err(ConfigurationError::InvalidUrl(bad.clone()));
    }

    Ok(urls)
}

/// Validate a URL blob and return the normalized form to persist.
///
/// # Errors
///
/// Same as [`validate_urls`].
pub fn clean_urls(value: Option<&str>) -> Result<String, ConfigurationError> {
    validate_urls(value).map(|urls| urls.join("\n"))
}

/// Basic well-formedness check for one webhook line.
fn is_valid_url(candidate: &str) -> bool {
    if !ALLOWED_PREFIXES
        .iter()
        .any(|prefix| candidate.starts_with(prefix))
    {
        return false;
    }

    Url::parse(candidate)
        .map(|url| url.host_str().is_some_and(|host| !host.is_empty()))
        .unwrap_or(false)
}

/// Strip the query string so webhook keys stay out of logs.
#[must_use]
pub fn redact(webhook_url: &str) -> String {
    match Url::parse(webhook_url) {
        Ok(mut url) => {
            if url.query().is_some() {
                url.set_query(Some("key=***"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}
