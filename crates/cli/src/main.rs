//! wechat-notify CLI - check robot webhook settings and send test alerts.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wechat_notify::urls::redact;
use wechat_notify::{
    clean_urls, format_payload, validate_urls, Event, FormatOptions, Group,
    MemoryConfigProvider, NotifierSettings, Template, WechatNotifier, URLS_OPTION,
};

/// Send error-tracking alerts to WeChat Work group robots.
#[derive(Parser)]
#[command(name = "wechat-notify")]
#[command(about = "WeChat Work robot notifier tooling")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a webhook URL list (one per line) and print the stored form
    Validate {
        /// File holding the URL list (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Print the robot payload for an event without sending it
    Preview {
        /// Event JSON file
        #[arg(long)]
        event: PathBuf,

        /// Group JSON file
        #[arg(long)]
        group: PathBuf,

        /// Message template (minimal or extended)
        #[arg(long)]
        template: Option<Template>,

        /// Escape markdown in the event message and tags
        #[arg(long)]
        escape_markdown: bool,
    },

    /// Send an alert for an event to every URL in a list
    Send {
        /// File holding the URL list
        #[arg(long)]
        urls_file: PathBuf,

        /// Event JSON file
        #[arg(long)]
        event: PathBuf,

        /// Group JSON file
        #[arg(long)]
        group: PathBuf,

        /// Message template (minimal or extended)
        #[arg(long)]
        template: Option<Template>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("wechat_notify=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate { file } => {
            let blob = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())
                    .context("Failed to read URL list from stdin")?,
            };
            println!("{}", validate_command(&blob)?);
        }

        Commands::Preview {
            event,
            group,
            template,
            escape_markdown,
        } => {
            let event: Event = read_json(&event)?;
            let group: Group = read_json(&group)?;
            let options = FormatOptions {
                template: template.unwrap_or_default(),
                escape_markdown,
            };
            let payload = format_payload(&group, &event, options);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }

        Commands::Send {
            urls_file,
            event,
            group,
            template,
            timeout,
            insecure,
        } => {
            let blob = std::fs::read_to_string(&urls_file)
                .with_context(|| format!("Failed to read {}", urls_file.display()))?;
            let event: Event = read_json(&event)?;
            let group: Group = read_json(&group)?;

            let mut settings = NotifierSettings::from_env();
            if let Some(template) = template {
                settings.template = template;
            }
            if let Some(secs) = timeout {
                settings.timeout = Duration::from_secs(secs);
            }
            if insecure {
                settings.verify_tls = false;
            }

            send_command(&blob, &group, &event, settings).await?;
        }
    }

    Ok(())
}

/// Validate a URL blob and return its normalized, storable form.
fn validate_command(blob: &str) -> Result<String> {
    let cleaned = clean_urls(Some(blob)).context("URL list rejected")?;
    if cleaned.is_empty() {
        info!("URL list is empty; the project will be treated as not configured");
    }
    Ok(cleaned)
}

/// Deliver one alert and fail if any webhook did not accept it.
async fn send_command(
    blob: &str,
    group: &Group,
    event: &Event,
    settings: NotifierSettings,
) -> Result<()> {
    if settings.disabled {
        bail!("Notifications are disabled (NOTIFY_DISABLED); nothing sent");
    }

    let urls = validate_urls(Some(blob)).context("URL list rejected")?;
    if urls.is_empty() {
        bail!("No webhook URLs to send to");
    }

    let provider = Arc::new(MemoryConfigProvider::new());
    provider.set(group.project, URLS_OPTION, urls.join("\n"));

    let notifier = WechatNotifier::new(provider, settings)?;
    let results = notifier.deliver(group, event).await;

    if results.is_empty() && group.is_ignored() {
        info!(group = group.id, "Group is ignored, nothing sent");
        return Ok(());
    }

    let mut failures = 0usize;
    for (url, result) in &results {
        match result {
            Ok(()) => println!("ok      {}", redact(url)),
            Err(e) => {
                failures += 1;
                println!("failed  {}: {e}", redact(url));
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} webhook(s) failed", results.len());
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
