//! Instance Record Store
//!
//! Durable single-row-per-organization state over the shared SQLite pool.
//! No transaction ever spans a gateway call and a store write; callers own
//! the resulting consistency model.

use super::types::InstanceRecord;
use crate::gateway::InstanceStatus;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct InstanceStore {
    pool: SqlitePool,
}

impl InstanceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Direct pool access so tests can sabotage the schema.
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load the instance row for an organization, if one exists.
    pub async fn fetch(&self, org_id: &str) -> Result<Option<InstanceRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT org_id, instance_name, token, status, phone_number,
                    webhook_configured, created_at, last_connected_at
             FROM wa_instances WHERE org_id = ?",
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    /// Insert the row for a newly provisioned instance. Fails on the primary
    /// key when a row already exists — one instance per organization.
    pub async fn insert(&self, record: &InstanceRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO wa_instances
                 (org_id, instance_name, token, status, phone_number,
                  webhook_configured, created_at, last_connected_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.org_id)
        .bind(&record.instance_name)
        .bind(&record.token)
        .bind(record.status.as_str())
        .bind(record.phone_number.as_deref())
        .bind(record.webhook_configured)
        .bind(record.created_at)
        .bind(record.last_connected_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write status and phone, stamping `last_connected_at` only when a stamp
    /// is provided (a transition into connected).
    ///
    /// Plain read-then-write: there is no version column, so a poll racing a
    /// disconnect is last-writer-wins. Accepted inconsistency window.
    pub async fn update_status(
        &self,
        org_id: &str,
        status: InstanceStatus,
        phone_number: Option<&str>,
        connected_stamp: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE wa_instances
             SET status = ?, phone_number = ?,
                 last_connected_at = COALESCE(?, last_connected_at)
             WHERE org_id = ?",
        )
        .bind(status.as_str())
        .bind(phone_number)
        .bind(connected_stamp)
        .bind(org_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove the organization's instance row. Returns whether a row existed.
    pub async fn delete(&self, org_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wa_instances WHERE org_id = ?")
            .bind(org_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn record_from_row(row: &SqliteRow) -> InstanceRecord {
    InstanceRecord {
        org_id: row.get("org_id"),
        instance_name: row.get("instance_name"),
        token: row.get("token"),
        status: InstanceStatus::parse(row.get::<String, _>("status").as_str()),
        phone_number: row.get("phone_number"),
        webhook_configured: row.get("webhook_configured"),
        created_at: row.get("created_at"),
        last_connected_at: row.get("last_connected_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> InstanceStore {
        let pool = crate::db::open_pool("sqlite::memory:")
            .await
            .expect("in-memory pool");
        InstanceStore::new(pool)
    }

    fn record(org_id: &str) -> InstanceRecord {
        InstanceRecord {
            org_id: org_id.to_string(),
            instance_name: format!("org_{org_id}"),
            token: "tok123".to_string(),
            status: InstanceStatus::Connecting,
            phone_number: None,
            webhook_configured: true,
            created_at: Utc::now(),
            last_connected_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let store = store().await;
        store.insert(&record("T1")).await.expect("insert");

        let fetched = store.fetch("T1").await.expect("fetch").expect("row");
        assert_eq!(fetched.org_id, "T1");
        assert_eq!(fetched.token, "tok123");
        assert_eq!(fetched.status, InstanceStatus::Connecting);
        assert!(fetched.webhook_configured);
        assert_eq!(fetched.last_connected_at, None);
    }

    #[tokio::test]
    async fn test_one_row_per_organization() {
        let store = store().await;
        store.insert(&record("T1")).await.expect("first insert");
        let err = store.insert(&record("T1")).await;
        assert!(err.is_err(), "second insert for the same org must fail");
    }

    #[tokio::test]
    async fn test_update_status_stamps_only_when_asked() {
        let store = store().await;
        store.insert(&record("T1")).await.expect("insert");

        let stamp = Utc::now();
        store
            .update_status("T1", InstanceStatus::Connected, Some("5511999999999"), Some(stamp))
            .await
            .expect("update");
        let row = store.fetch("T1").await.expect("fetch").expect("row");
        assert_eq!(row.status, InstanceStatus::Connected);
        assert_eq!(row.phone_number.as_deref(), Some("5511999999999"));
        let stamped = row.last_connected_at.expect("stamp set");

        // A later write without a stamp keeps the earlier one
        store
            .update_status("T1", InstanceStatus::Connected, Some("5511999999999"), None)
            .await
            .expect("update");
        let row = store.fetch("T1").await.expect("fetch").expect("row");
        assert_eq!(row.last_connected_at, Some(stamped));
    }

    #[tokio::test]
    async fn test_update_status_clears_phone() {
        let store = store().await;
        store.insert(&record("T1")).await.expect("insert");
        store
            .update_status("T1", InstanceStatus::Connected, Some("5511999999999"), Some(Utc::now()))
            .await
            .expect("update");

        store
            .update_status("T1", InstanceStatus::Disconnected, None, None)
            .await
            .expect("update");
        let row = store.fetch("T1").await.expect("fetch").expect("row");
        assert_eq!(row.status, InstanceStatus::Disconnected);
        assert_eq!(row.phone_number, None);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = store().await;
        store.insert(&record("T1")).await.expect("insert");

        assert!(store.delete("T1").await.expect("delete"));
        assert!(store.fetch("T1").await.expect("fetch").is_none());
        assert!(!store.delete("T1").await.expect("second delete"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_org_is_none() {
        let store = store().await;
        assert!(store.fetch("nope").await.expect("fetch").is_none());
    }
}
