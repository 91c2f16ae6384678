use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use store::Record;

/// Kind tag carried by every meeting record.
pub const MINUTES: &str = "Minutes";

fn default_kind() -> String {
    MINUTES.to_string()
}

/// Meeting minutes, stored at `meetings/{id}`.
///
/// The summary is admin-authored; `notes` is an append-only thread any active
/// member can add to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub title: String,
    pub date: NaiveDate,
    /// Summary / minutes text.
    pub content: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Record for Meeting {
    const COLLECTION: &'static str = "meetings";
}

/// One entry in a meeting's note thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
