//! Scroll spy WebSocket message protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scroll_spy::{LayoutSnapshot, ScrollSpyOptions, SectionRef, VisibilityEntry};

/// Messages sent from a client to the `/ws` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Replace the observed section list.
    Register { sections: Vec<SectionRef> },
    /// Recreate the observation with new options.
    Configure { options: ScrollSpyOptions },
    /// Precomputed visible fractions.
    Visibility { entries: Vec<VisibilityEntry> },
    /// Raw geometry; the server computes the fractions.
    Layout { snapshot: LayoutSnapshot },
    /// Stop observing until the next `Register`.
    Detach,
    Ping {
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Messages sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Registered { sections: usize, generation: u64 },
    Configured { generation: u64, threshold: f64 },
    /// Result of a visibility or layout notification. `fragment` is the URL
    /// hash to show, `#<id>`.
    ActiveSection {
        id: Option<String>,
        fragment: Option<String>,
    },
    Detached { was_attached: bool },
    Pong { timestamp: DateTime<Utc> },
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
