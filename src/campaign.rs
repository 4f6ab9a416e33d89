//! Campaign Dispatch
//!
//! Queue of outbound campaign messages and the dispatcher that drains it in
//! small throttled batches. One invocation handles at most [`BATCH_SIZE`]
//! rows with a fixed pause between sends; rows are marked `sent`/`failed` as
//! they complete, so an interrupted batch is distinguishable only by the
//! subset already marked. No resumption guarantee beyond that.

use crate::error::{Result, ZapgateError};
use crate::gateway::{InstanceStatus, WhatsAppGateway};
use crate::instance::InstanceStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Maximum rows handled per dispatch invocation.
pub const BATCH_SIZE: usize = 5;

/// Pause between sequential sends, throttling outbound rate.
const SEND_PAUSE: Duration = Duration::from_secs(1);

/// Dispatch state of a campaign message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Queued,
    Sent,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Queued => "queued",
            CampaignStatus::Sent => "sent",
            CampaignStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "sent" => CampaignStatus::Sent,
            "failed" => CampaignStatus::Failed,
            _ => CampaignStatus::Queued,
        }
    }
}

/// One queued outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignMessage {
    pub id: String,
    pub org_id: String,
    pub to_number: String,
    pub body: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Queue persistence over the shared pool.
#[derive(Clone)]
pub struct CampaignStore {
    pool: SqlitePool,
}

impl CampaignStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Queue a message for later dispatch.
    pub async fn queue(
        &self,
        org_id: &str,
        to_number: &str,
        body: &str,
    ) -> sqlx::Result<CampaignMessage> {
        let message = CampaignMessage {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            to_number: to_number.to_string(),
            body: body.to_string(),
            status: CampaignStatus::Queued,
            created_at: Utc::now(),
            dispatched_at: None,
            last_error: None,
        };
        sqlx::query(
            "INSERT INTO campaign_messages
                 (id, org_id, to_number, body, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.org_id)
        .bind(&message.to_number)
        .bind(&message.body)
        .bind(message.status.as_str())
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(message)
    }

    /// Oldest queued messages for an organization, up to `limit`.
    pub async fn next_batch(
        &self,
        org_id: &str,
        limit: usize,
    ) -> sqlx::Result<Vec<CampaignMessage>> {
        let rows = sqlx::query(
            "SELECT id, org_id, to_number, body, status, created_at, dispatched_at, last_error
             FROM campaign_messages
             WHERE org_id = ? AND status = 'queued'
             ORDER BY created_at
             LIMIT ?",
        )
        .bind(org_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn mark_sent(&self, id: &str) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE campaign_messages SET status = 'sent', dispatched_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, id: &str, error: &str) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE campaign_messages
             SET status = 'failed', dispatched_at = ?, last_error = ?
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All campaign messages for an organization, oldest first.
    pub async fn list(&self, org_id: &str) -> sqlx::Result<Vec<CampaignMessage>> {
        let rows = sqlx::query(
            "SELECT id, org_id, to_number, body, status, created_at, dispatched_at, last_error
             FROM campaign_messages
             WHERE org_id = ?
             ORDER BY created_at",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(message_from_row).collect())
    }
}

fn message_from_row(row: &SqliteRow) -> CampaignMessage {
    CampaignMessage {
        id: row.get("id"),
        org_id: row.get("org_id"),
        to_number: row.get("to_number"),
        body: row.get("body"),
        status: CampaignStatus::parse(row.get::<String, _>("status").as_str()),
        created_at: row.get("created_at"),
        dispatched_at: row.get("dispatched_at"),
        last_error: row.get("last_error"),
    }
}

/// Counts reported after one dispatch pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Sequential throttled sender over the campaign queue.
pub struct CampaignDispatcher {
    gateway: Arc<dyn WhatsAppGateway>,
    instances: InstanceStore,
    store: CampaignStore,
}

impl CampaignDispatcher {
    pub fn new(
        gateway: Arc<dyn WhatsAppGateway>,
        instances: InstanceStore,
        store: CampaignStore,
    ) -> Self {
        Self {
            gateway,
            instances,
            store,
        }
    }

    /// One dispatch pass for an organization. Requires a connected instance
    /// when there is anything to send. A send failure fails that row only;
    /// the batch continues.
    pub async fn run_once(&self, org_id: &str) -> Result<DispatchSummary> {
        let batch = self.store.next_batch(org_id, BATCH_SIZE).await?;
        if batch.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let instance = self.instances.fetch(org_id).await?.ok_or_else(|| {
            ZapgateError::NotFound(format!("WhatsApp instance for organization {org_id}"))
        })?;
        if instance.status != InstanceStatus::Connected {
            return Err(ZapgateError::NotConnected(org_id.to_string()));
        }

        let mut summary = DispatchSummary::default();
        for (index, message) in batch.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(SEND_PAUSE).await;
            }
            match self
                .gateway
                .send_text(&instance.token, &message.to_number, &message.body)
                .await
            {
                Ok(_) => {
                    self.store.mark_sent(&message.id).await?;
                    summary.sent += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "campaign: send to {} failed: {}",
                        message.to_number,
                        e
                    );
                    self.store.mark_failed(&message.id, &e.to_string()).await?;
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "campaign: batch for organization {} done: {} sent, {} failed",
            org_id,
            summary.sent,
            summary.failed
        );
        Ok(summary)
    }
}
