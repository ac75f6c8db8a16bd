use serde::{Deserialize, Serialize};

use crate::utils::clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Join,
    Message,
    Leave,
    Command,
}

/// One entry of a room's history. Serialized with the capitalised field
/// names browsers already expect: `{"Type","User","Timestamp","Text"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(rename = "Type")]
    pub kind: EventKind,
    pub user: String,
    /// Seconds since the epoch.
    pub timestamp: i64,
    pub text: String,
}

impl Event {
    /// Stamp a new event with the current time.
    pub fn now(kind: EventKind, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self { kind, user: user.into(), timestamp: clock::now_secs(), text: text.into() }
    }
}
