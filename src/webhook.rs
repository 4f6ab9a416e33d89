//! Gateway Webhook Events
//!
//! Payload model for the events the gateway posts to the configured callback
//! URL, the connection-event application that keeps stored rows in sync, and
//! callback URL resolution. Hosting the HTTP receiver itself is an external
//! concern.

use crate::error::Result;
use crate::gateway::{InstanceStatus, ObservedInstance};
use crate::instance::{reconcile, InstanceStore};
use chrono::Utc;
use serde::Deserialize;

/// Production origin used when no acceptable public URL is configured.
pub const FALLBACK_PUBLIC_ORIGIN: &str = "https://app.zapgate.io";

/// Path the gateway posts events to, under the public origin.
pub const CALLBACK_PATH: &str = "/api/webhooks/whatsapp";

/// Host fragments that mark a non-production origin.
const NON_PRODUCTION_MARKERS: [&str; 5] = [
    "localhost",
    "127.0.0.1",
    ".vercel.app",
    "staging.",
    "preview.",
];

/// Resolve the callback URL registered with the gateway. The gateway keeps
/// exactly one URL per instance, and it must be a stable production HTTPS
/// origin: preview/staging origins and plain-http origins resolve to the
/// hardcoded fallback instead.
pub fn resolve_callback_url(configured: Option<&str>) -> String {
    let origin = match configured {
        Some(url) if is_production_origin(url) => url.trim_end_matches('/').to_string(),
        Some(url) => {
            tracing::warn!(
                "webhook: configured origin {} is not a production origin, using fallback",
                url
            );
            FALLBACK_PUBLIC_ORIGIN.to_string()
        }
        None => FALLBACK_PUBLIC_ORIGIN.to_string(),
    };
    format!("{origin}{CALLBACK_PATH}")
}

fn is_production_origin(url: &str) -> bool {
    url.starts_with("https://")
        && !NON_PRODUCTION_MARKERS
            .iter()
            .any(|marker| url.contains(marker))
}

/// Envelope for events posted by the gateway, tagged by `event`.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WebhookEvent {
    Connection(ConnectionEvent),
    Messages(MessageEvent),
    MessagesUpdate(MessageUpdateEvent),
}

/// Connection state change for one instance.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEvent {
    /// Gateway-side instance name the event belongs to.
    pub instance: String,
    pub status: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Inbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub instance: String,
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "fromMe")]
    pub from_me: bool,
    #[serde(default)]
    pub timestamp: i64,
}

/// Delivery/read state change for a previously sent message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageUpdateEvent {
    pub instance: String,
    pub id: String,
    pub status: String,
}

/// Fold a connection event into the stored record for `org_id`, persisting
/// on divergence. Returns whether anything was written. Events for
/// organizations without a record are ignored — the row may already have
/// been torn down by the time the event arrives.
pub async fn apply_connection_event(
    store: &InstanceStore,
    org_id: &str,
    event: &ConnectionEvent,
) -> Result<bool> {
    let Some(stored) = store.fetch(org_id).await? else {
        tracing::debug!(
            "webhook: connection event for organization {} with no instance record, ignoring",
            org_id
        );
        return Ok(false);
    };

    let observed = ObservedInstance {
        status: InstanceStatus::from_gateway(&event.status),
        phone_number: event.phone.clone().filter(|p| !p.is_empty()),
    };
    let now = Utc::now();
    let outcome = reconcile(&stored, &observed, now);
    if outcome.changed {
        store
            .update_status(
                org_id,
                outcome.record.status,
                outcome.record.phone_number.as_deref(),
                outcome.entered_connected.then_some(now),
            )
            .await?;
        tracing::info!(
            "webhook: organization {} moved to {} via connection event",
            org_id,
            outcome.record.status
        );
    }
    Ok(outcome.changed)
}
