// src/event.rs
//! Feed event model shared by the wire decoder, the store and the HTTP surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of event categories. Anything else on the wire is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Status,
    Notification,
    Activity,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Status, Category::Notification, Category::Activity];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Status => "status",
            Category::Notification => "notification",
            Category::Activity => "activity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Exact, case-sensitive match; `"Status"` is not a category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Category::Status),
            "notification" => Ok(Category::Notification),
            "activity" => Ok(Category::Activity),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// One admitted feed item. Fields are kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Producer's timestamp, display only; never used for ordering.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub content: String,
}

impl FeedEvent {
    pub fn new(timestamp: impl Into<String>, category: Category, content: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            category,
            content: content.into(),
        }
    }
}
