//! WeChat Work group robot notifications for error-tracking alerts.
//!
//! This crate forwards alerts raised by an issue-tracking host to one or
//! more WeChat Work robot webhooks. Delivery is best-effort: a failing
//! webhook is logged and never affects the caller.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use wechat_notify::{
//!     Event, Group, MemoryConfigProvider, Notifier, Project, WechatNotifier, URLS_OPTION,
//! };
//!
//! # async fn run() -> Result<(), wechat_notify::ConfigurationError> {
//! let options = Arc::new(MemoryConfigProvider::new());
//! options.set(7, URLS_OPTION, "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=...");
//!
//! // Timeout, TLS and template settings come from WECHAT_NOTIFY_* variables
//! let notifier = WechatNotifier::from_env(options)?;
//!
//! let group = Group {
//!     id: 1,
//!     project: 7,
//!     absolute_url: "https://sentry.example/acme/backend/issues/1/".to_string(),
//!     ignored: false,
//! };
//! let event = Event {
//!     id: "42".to_string(),
//!     message: "NullPointerException".to_string(),
//!     project: Project { id: 7, slug: "backend".to_string() },
//!     tags: Default::default(),
//! };
//!
//! // Never fails; delivery errors are logged
//! notifier.notify(&group, &event).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`urls`] splits and validates the stored webhook URL list
//! - [`payload`] renders the markdown robot message
//! - [`WebhookClient`] posts one payload to one URL
//! - [`WechatNotifier`] implements the host-facing [`Notifier`] capability

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod event;
pub mod payload;
pub mod plugin;
pub mod urls;
pub mod webhook;

pub use config::{
    ConfigProvider, MemoryConfigProvider, NotifierSettings, PluginOptions, URLS_OPTION,
};
pub use error::{ConfigurationError, DeliveryError};
pub use event::{Event, Group, Project, ProjectId};
pub use payload::{format_payload, FormatOptions, RobotPayload, Template};
pub use plugin::{ConfigField, Delivery, PluginInfo, WechatNotifier, PLUGIN_INFO};
pub use urls::{clean_urls, split_urls, validate_urls};
pub use webhook::WebhookClient;

use async_trait::async_trait;

/// Capability the host invokes on a notification plugin.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Registry slug of this plugin.
    fn slug(&self) -> &'static str;

    /// Validate and normalize project options before the host stores them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when an option value is rejected.
    fn configure(&self, options: &PluginOptions) -> Result<PluginOptions, ConfigurationError>;

    /// Whether the project has anything to notify.
    fn is_configured(&self, project: ProjectId) -> bool;

    /// Send an alert for `event`. Never fails from the caller's view.
    async fn notify(&self, group: &Group, event: &Event);
}
