//! Markdown payload formatting for the WeChat Work group robot.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::event::{Event, Group};

/// Placeholder rendered for tags the event does not carry.
const MISSING_TAG: &str = "n/a";

/// Characters that change meaning in robot markdown.
const MARKDOWN_SPECIAL: &[char] = &['\\', '`', '*', '_', '[', ']', '(', ')', '#', '>', '<'];

/// Which message layout to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Template {
    /// Title plus message and link
    #[default]
    Minimal,
    /// Adds `environment`, `level` and `logger` tag lines
    Extended,
}

impl Template {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "extended" => Ok(Self::Extended),
            other => Err(format!("unknown template '{other}'")),
        }
    }
}

/// Formatting options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    pub template: Template,
    /// Backslash-escape markdown in user-controlled text. Off by default so
    /// messages render exactly as the host reported them.
    pub escape_markdown: bool,
}

/// Request body accepted by the robot webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobotPayload {
    pub msgtype: &'static str,
    pub markdown: MarkdownBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownBody {
    pub content: String,
}

impl RobotPayload {
    /// Wrap markdown content in a robot message.
    #[must_use]
    pub fn markdown(content: String) -> Self {
        Self {
            msgtype: "markdown",
            markdown: MarkdownBody { content },
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.markdown.content
    }
}

/// Build the robot payload for an event.
#[must_use]
pub fn format_payload(group: &Group, event: &Event, options: FormatOptions) -> RobotPayload {
    let text = |value: &str| {
        if options.escape_markdown {
            escape_markdown(value)
        } else {
            value.to_string()
        }
    };
    let tag = |name: &str| text(event.get_tag(name).unwrap_or(MISSING_TAG));

    let title = format!("New alert from {}", text(&event.project.slug));
    let message = text(&event.message);
    let link = event_link(group.absolute_url(), &event.id);

    let content = match options.template {
        Template::Minimal => format!("#### {title} \n > {message} [href]({link})"),
        Template::Extended => format!(
            "#### {title} \n > environment: {} \n > level: {} \n > logger: {} \n > {message} [href]({link})",
            tag("environment"),
            tag("level"),
            tag("logger"),
        ),
    };

    RobotPayload::markdown(content)
}

/// Link to a single event under its issue page.
fn event_link(group_url: &str, event_id: &str) -> String {
    format!("{}/events/{event_id}/", group_url.trim_end_matches('/'))
}

/// Backslash-escape markdown metacharacters and flatten newlines.
#[must_use]
pub fn escape_markdown(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' | '\r' => escaped.push(' '),
            c if MARKDOWN_SPECIAL.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
