//! Inbound honeypot events
//!
//! Only two event kinds carry URLs: file downloads (a structured `url`
//! field) and shell command input (free text in `input`).

use serde::{Deserialize, Serialize};

/// Kinds of honeypot events relevant to URL sniffing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A session downloaded a file
    FileDownload,
    /// An attacker typed a shell command
    CommandInput,
    /// Anything else (ignored)
    Other,
}

impl EventKind {
    /// Map a short kind or a full honeypot event id to a kind.
    ///
    /// Accepts `file_download` / `cowrie.session.file_download` and
    /// `command_input` / `cowrie.command.input`.
    pub fn from_event_id(id: &str) -> Self {
        match id {
            "file_download" | "cowrie.session.file_download" => Self::FileDownload,
            "command_input" | "cowrie.command.input" => Self::CommandInput,
            _ => Self::Other,
        }
    }
}

/// A honeypot event as delivered by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// Full honeypot event id
    #[serde(default)]
    pub eventid: String,
    /// Short kind name, consulted only when `eventid` is absent
    #[serde(default, rename = "kind", skip_serializing_if = "Option::is_none")]
    pub short_kind: Option<String>,
    /// Download URL (file download events)
    #[serde(default)]
    pub url: Option<String>,
    /// Raw command text (command input events)
    #[serde(default)]
    pub input: Option<String>,
}

impl Event {
    pub fn file_download(url: &str) -> Self {
        Self {
            eventid: "cowrie.session.file_download".to_string(),
            short_kind: None,
            url: Some(url.to_string()),
            input: None,
        }
    }

    pub fn command_input(input: &str) -> Self {
        Self {
            eventid: "cowrie.command.input".to_string(),
            short_kind: None,
            url: None,
            input: Some(input.to_string()),
        }
    }

    /// The event id, falling back to the short kind name
    pub fn id(&self) -> &str {
        if self.eventid.is_empty() {
            self.short_kind.as_deref().unwrap_or_default()
        } else {
            &self.eventid
        }
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_event_id(self.id())
    }

    /// Parse an event from a JSON object
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
