//! The WeChat Work robot notification plugin.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{ConfigProvider, NotifierSettings, PluginOptions, URLS_OPTION};
use crate::error::{ConfigurationError, DeliveryError};
use crate::event::{Event, Group, ProjectId};
use crate::payload::{format_payload, RobotPayload};
use crate::urls::{clean_urls, redact, split_urls};
use crate::webhook::WebhookClient;
use crate::Notifier;

const PLACEHOLDER_URL: &str = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=4929eab2";

/// Outcome of posting to one configured URL.
pub type Delivery = (String, Result<(), DeliveryError>);

/// Static description of the plugin for the host's plugin registry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PluginInfo {
    pub slug: &'static str,
    pub title: &'static str,
    pub author: &'static str,
    pub author_url: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub resource_links: &'static [(&'static str, &'static str)],
}

/// The plugin's registry entry.
pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    slug: "wechat",
    title: "WeChat",
    author: "jerry hu",
    author_url: "https://github.com/jerryhu1234/sentry-wechat",
    description: "Integrates WeChat Work group robots.",
    version: env!("CARGO_PKG_VERSION"),
    resource_links: &[
        ("Bug Tracker", "https://github.com/jerryhu1234/sentry-wechat/issues"),
        ("Source", "https://github.com/jerryhu1234/sentry-wechat"),
        (
            "README",
            "https://github.com/jerryhu1234/sentry-wechat/blob/master/README.md",
        ),
    ],
};

/// One field of the project settings form.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub help: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
}

/// Sends alerts to every WeChat robot URL configured for a project.
pub struct WechatNotifier {
    provider: Arc<dyn ConfigProvider>,
    settings: NotifierSettings,
    client: WebhookClient,
}

impl WechatNotifier {
    /// Create a notifier reading project options from `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::HttpClient`] if the HTTP client cannot
    /// be built.
    pub fn new(
        provider: Arc<dyn ConfigProvider>,
        settings: NotifierSettings,
    ) -> Result<Self, ConfigurationError> {
        let client = WebhookClient::new(&settings)?;

        info!(
            timeout_ms = u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
            verify_tls = settings.verify_tls,
            template = %settings.template,
            disabled = settings.disabled,
            "WeChat notifier initialized"
        );

        Ok(Self {
            provider,
            settings,
            client,
        })
    }

    /// Create a notifier with settings taken from the environment.
    ///
    /// # Errors
    ///
    /// Same as [`WechatNotifier::new`].
    pub fn from_env(provider: Arc<dyn ConfigProvider>) -> Result<Self, ConfigurationError> {
        Self::new(provider, NotifierSettings::from_env())
    }


    /// Fields rendered on the project settings form.
    #[must_use]
    pub fn config_fields() -> Vec<ConfigField> {
        vec![ConfigField {
            name: URLS_OPTION,
            label: "WeChat robot url",
            kind: "textarea",
            help: "Enter WeChat robot url (one per line).",
            placeholder: PLACEHOLDER_URL,
            required: false,
        }]
    }

    /// Webhook URLs stored for a project, in configured order.
    #[must_use]
    pub fn webhook_urls(&self, project: ProjectId) -> Vec<String> {
        split_urls(self.provider.get(project, URLS_OPTION).as_deref())
    }

    /// Render the payload that `notify` would send for this event.
    #[must_use]
    pub fn build_payload(&self, group: &Group, event: &Event) -> RobotPayload {
        format_payload(group, event, self.settings.format_options())
    }

    /// Post the alert to every configured URL and report each outcome.
    ///
    /// Returns an empty list when nothing is sent: notifications disabled,
    /// project unconfigured, or group ignored.
    pub async fn deliver(&self, group: &Group, event: &Event) -> Vec<Delivery> {
        if self.settings.disabled {
            debug!("Notifications disabled, skipping event");
            return vec![];
        }

        let urls = self.webhook_urls(group.project);
        if urls.is_empty() {
            debug!(project = group.project, "No webhook URLs configured, skipping event");
            return vec![];
        }

        if group.is_ignored() {
            debug!(group = group.id, "Group is ignored, skipping event");
            return vec![];
        }

        let payload = self.build_payload(group, event);
        let mut results = Vec::with_capacity(urls.len());

        for url in urls {
            let result = self.client.post(&url, &payload).await;
            results.push((url, result));
        }

        results
    }
}

#[async_trait]
impl Notifier for WechatNotifier {
    fn slug(&self) -> &'static str {
        PLUGIN_INFO.slug
    }

    fn configure(&self, options: &PluginOptions) -> Result<PluginOptions, ConfigurationError> {
        let mut cleaned = options.clone();
        let urls = clean_urls(options.get(URLS_OPTION).map(String::as_str))?;
        cleaned.insert(URLS_OPTION.to_string(), urls);
        Ok(cleaned)
    }

    fn is_configured(&self, project: ProjectId) -> bool {
        !self.webhook_urls(project).is_empty()
    }

    async fn notify(&self, group: &Group, event: &Event) {
        for (url, result) in self.deliver(group, event).await {
            match result {
                Ok(()) => debug!(url = %redact(&url), event = %event.id, "Alert delivered"),
                Err(e) => error!(
                    url = %redact(&url),
                    event = %event.id,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Failed to deliver alert"
                ),
            }
        }
    }
}
