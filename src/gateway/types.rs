//! Gateway Types
//!
//! Shared types for talking to the external WhatsApp gateway: the connection
//! status vocabulary and the typed results of each gateway operation.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Connection state of a tenant's WhatsApp instance.
///
/// `NotConfigured` is the no-row state — it never reaches the gateway wire,
/// but the tenant-facing API reports it when no instance exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    NotConfigured,
    Disconnected,
    Connecting,
    Connected,
}

impl InstanceStatus {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::NotConfigured => "not_configured",
            InstanceStatus::Disconnected => "disconnected",
            InstanceStatus::Connecting => "connecting",
            InstanceStatus::Connected => "connected",
        }
    }

    /// Parse a stored status string. Unknown values degrade to `Disconnected`
    /// rather than failing the read.
    pub fn parse(s: &str) -> Self {
        match s {
            "not_configured" => InstanceStatus::NotConfigured,
            "connecting" => InstanceStatus::Connecting,
            "connected" => InstanceStatus::Connected,
            _ => InstanceStatus::Disconnected,
        }
    }

    /// Map the gateway's status strings onto our vocabulary. The gateway is
    /// not consistent across versions ("open", "qrcode", "pairing" all show
    /// up), so anything not clearly live or pairing counts as disconnected.
    pub fn from_gateway(s: &str) -> Self {
        match s {
            "connected" | "open" => InstanceStatus::Connected,
            "connecting" | "qrcode" | "pairing" => InstanceStatus::Connecting,
            _ => InstanceStatus::Disconnected,
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of provisioning a remote instance: the gateway-assigned name and
/// the per-instance bearer token.
#[derive(Debug, Clone)]
pub struct CreatedInstance {
    pub name: String,
    pub token: String,
}

/// Ephemeral pairing payload returned by a connect call. Valid only until
/// consumed or superseded by the next connect call — never persisted.
#[derive(Debug, Clone, Default)]
pub struct ConnectionAttempt {
    pub qrcode: Option<String>,
    pub pairing_code: Option<String>,
}

/// The gateway's view of one instance, as observed via the fleet listing or
/// a connection webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedInstance {
    pub status: InstanceStatus,
    pub phone_number: Option<String>,
}

/// Acknowledgement for an outbound send.
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// One contact known to the connected WhatsApp account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub number: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Media kinds the gateway accepts on the send endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }

    /// Parse a user-supplied kind name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            "document" => Some(MediaKind::Document),
            _ => None,
        }
    }
}

/// Outbound media payload. The gateway's `file` field accepts either a
/// publicly reachable URL or base64-encoded content.
#[derive(Debug, Clone)]
pub struct OutgoingMedia {
    pub kind: MediaKind,
    pub file: String,
    pub caption: Option<String>,
    pub filename: Option<String>,
}

impl OutgoingMedia {
    /// Media referenced by URL; the gateway fetches it server-side.
    pub fn from_url(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            file: url.into(),
            caption: None,
            filename: None,
        }
    }

    /// Media uploaded inline as base64.
    pub fn from_bytes(kind: MediaKind, bytes: &[u8]) -> Self {
        Self {
            kind,
            file: base64::engine::general_purpose::STANDARD.encode(bytes),
            caption: None,
            filename: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Media content fetched back from the gateway for a received message.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadedMedia {
    pub base64: Option<String>,
    pub url: Option<String>,
    pub mimetype: Option<String>,
}
