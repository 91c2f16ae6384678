use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use store::Record;

/// A community event, stored at `events/{id}`. Admin-authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub date: NaiveDate,
    /// Start time as `HH:MM`.
    pub time: String,
    pub location: String,
    #[serde(rename = "desc")]
    pub description: String,
}

impl Record for Event {
    const COLLECTION: &'static str = "events";
}
