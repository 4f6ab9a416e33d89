//! Database
//!
//! Shared SQLite pool and schema. Migrations are idempotent and run on every
//! pool open.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

/// Open (or create) the database at `path` and run migrations.
pub async fn open_pool(path: &str) -> Result<SqlitePool, sqlx::Error> {
    let memory = path.contains(":memory:");
    let mut opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);
    if !memory {
        opts = opts.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    }

    // Each connection to an in-memory database sees its own empty database,
    // so those pools are pinned to a single connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(if memory { 1 } else { 4 })
        .connect_with(opts)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let sql = r#"
        CREATE TABLE IF NOT EXISTS wa_instances (
            org_id              TEXT PRIMARY KEY,
            instance_name       TEXT NOT NULL,
            token               TEXT NOT NULL,
            status              TEXT NOT NULL,
            phone_number        TEXT,
            webhook_configured  INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            last_connected_at   TEXT
        );
        CREATE TABLE IF NOT EXISTS campaign_messages (
            id              TEXT PRIMARY KEY,
            org_id          TEXT NOT NULL,
            to_number       TEXT NOT NULL,
            body            TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'queued',
            created_at      TEXT NOT NULL,
            dispatched_at   TEXT,
            last_error      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_campaign_org_status
            ON campaign_messages (org_id, status);
    "#;

    // Execute each statement separately (sqlx doesn't support multi-statement in one call)
    for stmt in sql.split(';') {
        let trimmed = stmt.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(pool).await?;
    }
    Ok(())
}

/// Row counts shown by `zapgate db stats`.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct DbStats {
    pub instances: i64,
    pub campaign_queued: i64,
    pub campaign_sent: i64,
    pub campaign_failed: i64,
}

pub async fn stats(pool: &SqlitePool) -> Result<DbStats, sqlx::Error> {
    let mut stats = DbStats::default();

    let row = sqlx::query("SELECT COUNT(*) AS n FROM wa_instances")
        .fetch_one(pool)
        .await?;
    stats.instances = row.get("n");

    let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM campaign_messages GROUP BY status")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let status: String = row.get("status");
        let n: i64 = row.get("n");
        match status.as_str() {
            "queued" => stats.campaign_queued = n,
            "sent" => stats.campaign_sent = n,
            "failed" => stats.campaign_failed = n,
            _ => {}
        }
    }
    Ok(stats)
}
