//! Project options and process-wide notifier settings.
//!
//! Per-project options (the webhook URL blob) come from the host through a
//! [`ConfigProvider`]. Process-wide settings are read from the environment:
//!
//! - `WECHAT_NOTIFY_TIMEOUT`: per-request timeout in seconds (default 3)
//! - `WECHAT_NOTIFY_INSECURE_SKIP_VERIFY`: set to "true" to skip TLS verification
//! - `WECHAT_NOTIFY_TEMPLATE`: `minimal` (default) or `extended`
//! - `WECHAT_NOTIFY_ESCAPE_MARKDOWN`: set to "true" to escape user text
//! - `NOTIFY_DISABLED`: set to "true" to turn every `notify` into a no-op

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::warn;

use crate::event::ProjectId;
use crate::payload::{FormatOptions, Template};

/// Option key holding the newline-separated webhook URLs.
pub const URLS_OPTION: &str = "urls";

const ENV_TIMEOUT: &str = "WECHAT_NOTIFY_TIMEOUT";
const ENV_INSECURE: &str = "WECHAT_NOTIFY_INSECURE_SKIP_VERIFY";
const ENV_TEMPLATE: &str = "WECHAT_NOTIFY_TEMPLATE";
const ENV_ESCAPE: &str = "WECHAT_NOTIFY_ESCAPE_MARKDOWN";
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Options map as stored by the host for one project.
pub type PluginOptions = HashMap<String, String>;

/// Read access to the host's per-project option store.
pub trait ConfigProvider: Send + Sync {
    /// Fetch a stored option value for a project.
    fn get(&self, project: ProjectId, key: &str) -> Option<String>;
}

/// In-process option store.
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    options: RwLock<HashMap<(ProjectId, String), String>>,
}

impl MemoryConfigProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one option value, replacing any previous value.
    pub fn set(&self, project: ProjectId, key: &str, value: impl Into<String>) {
        let mut options = self
            .options
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        options.insert((project, key.to_string()), value.into());
    }

    /// Store every entry of an options map for a project.
    pub fn set_all(&self, project: ProjectId, values: &PluginOptions) {
        for (key, value) in values {
            self.set(project, key, value.clone());
        }
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get(&self, project: ProjectId, key: &str) -> Option<String> {
        let options = self
            .options
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        options.get(&(project, key.to_string())).cloned()
    }
}

/// Process-wide settings shared by every notification.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// Bound on each webhook request
    pub timeout: Duration,
    /// Verify webhook TLS certificates
    pub verify_tls: bool,
    pub template: Template,
    pub escape_markdown: bool,
    /// Turns `notify` into a no-op
    pub disabled: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: true,
            template: Template::Minimal,
            escape_markdown: false,
            disabled: false,
        }
    }
}

impl NotifierSettings {
    /// Load settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    ///
    /// Values that fail to parse are logged and replaced by the default.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.timeout = Duration::from_secs(secs),
                _ => warn!(
                    variable = ENV_TIMEOUT,
                    value = %raw,
                    default_secs = DEFAULT_TIMEOUT_SECS,
                    "Invalid timeout, using default"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_TEMPLATE) {
            match raw.parse::<Template>() {
                Ok(template) => settings.template = template,
                Err(e) => warn!(variable = ENV_TEMPLATE, error = %e, "Using minimal template"),
            }
        }

        settings.verify_tls = !lookup(ENV_INSECURE).is_some_and(|v| is_truthy(&v));
        settings.escape_markdown = lookup(ENV_ESCAPE).is_some_and(|v| is_truthy(&v));
        settings.disabled = lookup(ENV_NOTIFY_DISABLED).is_some_and(|v| is_truthy(&v));

        if !settings.verify_tls {
            warn!("TLS certificate verification disabled for webhook requests");
        }

        settings
    }

    /// Formatting options derived from these settings.
    #[must_use]
    pub const fn format_options(&self) -> FormatOptions {
        FormatOptions {
            template: self.template,
            escape_markdown: self.escape_markdown,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}
