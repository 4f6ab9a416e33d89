//! Lifecycle Orchestrator
//!
//! The handler bodies behind the tenant-facing instance endpoints: provision,
//! reconnect, status, disconnect, delete, and the send operations gated on a
//! connected instance. Each operation is a short sequential chain of gateway
//! and store calls — no locking, no transaction across the two.
//!
//! Failure semantics: a gateway failure during provisioning is fatal and
//! triggers a best-effort compensating remote delete; during status polling
//! it degrades to reporting the stored state; during disconnect/delete it is
//! swallowed because local state must converge regardless of the remote.

use super::reconcile::reconcile;
use super::store::InstanceStore;
use super::types::{ConnectReport, InstanceRecord, StatusReport};
use crate::error::{Result, ZapgateError};
use crate::gateway::{
    Contact, DownloadedMedia, InstanceStatus, OutgoingMedia, SendReceipt, WhatsAppGateway,
};
use crate::tenant::{require_session, Caller};
use chrono::Utc;
use std::sync::Arc;

/// Remote instance name for an organization.
fn instance_name(org_id: &str) -> String {
    format!("org_{org_id}")
}

pub struct InstanceLifecycle {
    gateway: Arc<dyn WhatsAppGateway>,
    store: InstanceStore,
    webhook_url: String,
}

impl InstanceLifecycle {
    pub fn new(gateway: Arc<dyn WhatsAppGateway>, store: InstanceStore, webhook_url: String) -> Self {
        Self {
            gateway,
            store,
            webhook_url,
        }
    }

    /// Create the organization's instance: remote create, webhook setup,
    /// first connect, then persist as `connecting`.
    ///
    /// Any failure after the remote instance exists triggers a best-effort
    /// remote delete before the original error is surfaced — a compensating
    /// action, not a transaction.
    pub async fn provision(&self, caller: Option<&Caller>) -> Result<ConnectReport> {
        let caller = require_session(caller)?;
        let org_id = caller.org_id.as_str();

        if self.store.fetch(org_id).await?.is_some() {
            return Err(ZapgateError::Conflict(org_id.to_string()));
        }

        let created = self.gateway.create_instance(&instance_name(org_id)).await?;
        tracing::info!(
            "instance: created {} for organization {}",
            created.name,
            org_id
        );

        if let Err(e) = self
            .gateway
            .configure_webhook(&created.token, &self.webhook_url)
            .await
        {
            self.compensate_remote_delete(org_id, &created.token).await;
            return Err(e.into());
        }

        let attempt = match self.gateway.connect(&created.token).await {
            Ok(attempt) => attempt,
            Err(e) => {
                self.compensate_remote_delete(org_id, &created.token).await;
                return Err(e.into());
            }
        };

        let record = InstanceRecord {
            org_id: org_id.to_string(),
            instance_name: created.name,
            token: created.token.clone(),
            status: InstanceStatus::Connecting,
            phone_number: None,
            webhook_configured: true,
            created_at: Utc::now(),
            last_connected_at: None,
        };
        if let Err(e) = self.store.insert(&record).await {
            // The remote instance exists but the row does not; try to remove
            // the orphan before surfacing the persistence failure.
            self.compensate_remote_delete(org_id, &created.token).await;
            return Err(e.into());
        }

        Ok(ConnectReport {
            configured: true,
            status: InstanceStatus::Connecting,
            qrcode: attempt.qrcode,
            pairing_code: attempt.pairing_code,
        })
    }

    /// Request a fresh pairing code for an existing instance. No-op success
    /// when already connected.
    pub async fn reconnect(&self, caller: Option<&Caller>) -> Result<ConnectReport> {
        let caller = require_session(caller)?;
        let org_id = caller.org_id.as_str();
        let stored = self.record_for(org_id).await?;

        if stored.status == InstanceStatus::Connected {
            return Ok(ConnectReport {
                configured: true,
                status: InstanceStatus::Connected,
                qrcode: None,
                pairing_code: None,
            });
        }

        let attempt = self.gateway.connect(&stored.token).await?;
        self.store
            .update_status(
                org_id,
                InstanceStatus::Connecting,
                stored.phone_number.as_deref(),
                None,
            )
            .await?;

        Ok(ConnectReport {
            configured: true,
            status: InstanceStatus::Connecting,
            qrcode: attempt.qrcode,
            pairing_code: attempt.pairing_code,
        })
    }

    /// Read connection status, reconciling the stored row against the
    /// gateway's view. On gateway failure the stored state is returned with
    /// `degraded: true` and nothing is written — the caller learns that
    /// reconciliation did not happen, not that the instance is in that state.
    pub async fn status(&self, caller: Option<&Caller>) -> Result<StatusReport> {
        let caller = require_session(caller)?;
        let org_id = caller.org_id.as_str();

        let Some(stored) = self.store.fetch(org_id).await? else {
            return Ok(StatusReport {
                configured: false,
                status: InstanceStatus::NotConfigured,
                phone_number: None,
                degraded: false,
            });
        };

        match self.gateway.get_status(&stored.token).await {
            Ok(observed) => {
                let now = Utc::now();
                let outcome = reconcile(&stored, &observed, now);
                if outcome.changed {
                    self.store
                        .update_status(
                            org_id,
                            outcome.record.status,
                            outcome.record.phone_number.as_deref(),
                            outcome.entered_connected.then_some(now),
                        )
                        .await?;
                }
                Ok(StatusReport {
                    configured: true,
                    status: outcome.record.status,
                    phone_number: outcome.record.phone_number,
                    degraded: false,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "instance: status poll for organization {} failed, reporting stored state: {}",
                    org_id,
                    e
                );
                Ok(StatusReport {
                    configured: true,
                    status: stored.status,
                    phone_number: stored.phone_number,
                    degraded: true,
                })
            }
        }
    }

    /// Close the session. Requires owner or manager. Remote failure is
    /// tolerated; the stored row always converges to `disconnected` with the
    /// phone cleared.
    pub async fn disconnect(&self, caller: Option<&Caller>) -> Result<()> {
        let caller = require_session(caller)?;
        caller.require_manager()?;
        let org_id = caller.org_id.as_str();
        let stored = self.record_for(org_id).await?;

        if let Err(e) = self.gateway.disconnect(&stored.token).await {
            tracing::warn!(
                "instance: remote disconnect for organization {} failed, converging locally: {}",
                org_id,
                e
            );
        }
        self.store
            .update_status(org_id, InstanceStatus::Disconnected, None, None)
            .await?;
        tracing::info!("instance: organization {} disconnected", org_id);
        Ok(())
    }

    /// Tear the instance down. Requires owner or manager. Attempts remote
    /// deletion first but proceeds with local deletion regardless — remote
    /// absence is not an error.
    pub async fn delete(&self, caller: Option<&Caller>) -> Result<()> {
        let caller = require_session(caller)?;
        caller.require_manager()?;
        let org_id = caller.org_id.as_str();
        let stored = self.record_for(org_id).await?;

        if let Err(e) = self.gateway.delete_instance(&stored.token).await {
            tracing::warn!(
                "instance: remote delete for organization {} failed, removing local row anyway: {}",
                org_id,
                e
            );
        }
        self.store.delete(org_id).await?;
        tracing::info!("instance: organization {} instance deleted", org_id);
        Ok(())
    }

    /// Send a text message. Requires a connected instance.
    pub async fn send_text(
        &self,
        caller: Option<&Caller>,
        number: &str,
        text: &str,
    ) -> Result<SendReceipt> {
        let caller = require_session(caller)?;
        let stored = self.connected_record(caller.org_id.as_str()).await?;
        Ok(self.gateway.send_text(&stored.token, number, text).await?)
    }

    /// Send a media message. Requires a connected instance.
    pub async fn send_media(
        &self,
        caller: Option<&Caller>,
        number: &str,
        media: &OutgoingMedia,
    ) -> Result<SendReceipt> {
        let caller = require_session(caller)?;
        let stored = self.connected_record(caller.org_id.as_str()).await?;
        Ok(self.gateway.send_media(&stored.token, number, media).await?)
    }

    /// List contacts known to the connected account.
    pub async fn contacts(&self, caller: Option<&Caller>) -> Result<Vec<Contact>> {
        let caller = require_session(caller)?;
        let stored = self.record_for(caller.org_id.as_str()).await?;
        Ok(self.gateway.contacts(&stored.token).await?)
    }

    /// Fetch the profile picture URL for a number.
    pub async fn download_profile(
        &self,
        caller: Option<&Caller>,
        number: &str,
    ) -> Result<Option<String>> {
        let caller = require_session(caller)?;
        let stored = self.record_for(caller.org_id.as_str()).await?;
        Ok(self.gateway.download_profile(&stored.token, number).await?)
    }

    /// Fetch media content for a received message.
    pub async fn download_message(
        &self,
        caller: Option<&Caller>,
        message_id: &str,
    ) -> Result<DownloadedMedia> {
        let caller = require_session(caller)?;
        let stored = self.record_for(caller.org_id.as_str()).await?;
        Ok(self
            .gateway
            .download_message(&stored.token, message_id)
            .await?)
    }

    async fn record_for(&self, org_id: &str) -> Result<InstanceRecord> {
        self.store.fetch(org_id).await?.ok_or_else(|| {
            ZapgateError::NotFound(format!("WhatsApp instance for organization {org_id}"))
        })
    }

    async fn connected_record(&self, org_id: &str) -> Result<InstanceRecord> {
        let stored = self.record_for(org_id).await?;
        if stored.status != InstanceStatus::Connected {
            return Err(ZapgateError::NotConnected(org_id.to_string()));
        }
        Ok(stored)
    }

    /// Best-effort removal of a remote instance we could not finish setting
    /// up locally. Logged, never escalated, not retried.
    async fn compensate_remote_delete(&self, org_id: &str, token: &str) {
        if let Err(e) = self.gateway.delete_instance(token).await {
            tracing::warn!(
                "instance: compensating remote delete for organization {} failed: {}",
                org_id,
                e
            );
        }
    }
}
