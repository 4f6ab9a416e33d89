//! WhatsApp Gateway Client
//!
//! Typed wrapper around the external WhatsApp gateway's HTTP API. Fleet-level
//! calls (provisioning, status listing) authenticate with the admin token;
//! instance-scoped calls use the per-instance bearer token.

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpGateway;
pub use error::{GatewayError, Result};
pub use types::{
    ConnectionAttempt, Contact, CreatedInstance, DownloadedMedia, InstanceStatus, MediaKind,
    ObservedInstance, OutgoingMedia, SendReceipt,
};

use async_trait::async_trait;

/// Lifecycle and messaging operations against the WhatsApp gateway.
///
/// The trait is the seam between the orchestrator and the wire: production
/// code uses [`HttpGateway`], tests script a double. Callers must tolerate
/// failure of `disconnect`/`delete_instance` — the remote instance may
/// already be gone, and local convergence takes priority.
#[async_trait]
pub trait WhatsAppGateway: Send + Sync {
    /// Provision a new remote instance. Any non-2xx (including a name
    /// collision) is a failure — the remote's collision semantics are not
    /// guaranteed, so no retry with a mutated name is attempted.
    async fn create_instance(&self, name: &str) -> Result<CreatedInstance>;

    /// Register the callback URL and subscribed event set for an instance.
    async fn configure_webhook(&self, token: &str, url: &str) -> Result<()>;

    /// Request a fresh QR/pairing code. Idempotent from the caller's view —
    /// safe to call again after a previous code expired.
    async fn connect(&self, token: &str) -> Result<ConnectionAttempt>;

    /// Observe connection status and phone for the instance owning `token`.
    ///
    /// The gateway has no per-token status endpoint, so this lists the whole
    /// fleet under the admin token and matches client-side. An instance not
    /// present in the listing reads as `disconnected` with no phone — "not
    /// yet visible remotely", not an error.
    async fn get_status(&self, token: &str) -> Result<ObservedInstance>;

    /// Close the WhatsApp session. Best-effort from the caller's view.
    async fn disconnect(&self, token: &str) -> Result<()>;

    /// Remove the remote instance. Best-effort from the caller's view.
    async fn delete_instance(&self, token: &str) -> Result<()>;

    /// Send a plain text message.
    async fn send_text(&self, token: &str, number: &str, text: &str) -> Result<SendReceipt>;

    /// Send a media message (URL or inline base64 content).
    async fn send_media(
        &self,
        token: &str,
        number: &str,
        media: &OutgoingMedia,
    ) -> Result<SendReceipt>;

    /// List contacts known to the connected account.
    async fn contacts(&self, token: &str) -> Result<Vec<Contact>>;

    /// Fetch the profile picture URL for a number, if one is visible.
    async fn download_profile(&self, token: &str, number: &str) -> Result<Option<String>>;

    /// Fetch media content for a received message.
    async fn download_message(&self, token: &str, message_id: &str) -> Result<DownloadedMedia>;
}
