//! Alert records handed to the notifier by the host platform.
//!
//! The host owns these; the notifier only reads them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a project in the host platform.
pub type ProjectId = u64;

/// The project an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub slug: String,
}

/// A single error occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub message: String,
    pub project: Project,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl Event {
    /// Look up a tag value such as `environment`, `level` or `logger`.
    #[must_use]
    pub fn get_tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// An issue aggregating similar events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub project: ProjectId,
    pub absolute_url: String,
    #[serde(default)]
    pub ignored: bool,
}

impl Group {
    /// Absolute link to the issue page in the host UI.
    #[must_use]
    pub fn absolute_url(&self) -> &str {
        &self.absolute_url
    }

    /// Whether the issue is muted or resolved-and-ignored.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.ignored
    }
}
