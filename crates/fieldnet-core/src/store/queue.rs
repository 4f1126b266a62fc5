//! Offline write queue: enqueue, FIFO listing, sync marking, purge, sync marker.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;
use std::time::Duration;

use super::db::{duration_millis, unix_millis, OfflineStore};
use super::types::{
    CacheStatistics, OperationId, OperationKind, PendingOperation, PurgeReport,
    OPERATION_FORMAT_VERSION,
};

const LAST_SYNC: &str = "last_sync";

/// Queue position first, so ids sort like `seq` even across restarts and
/// clock changes.
fn operation_id(seq: i64, now: i64) -> OperationId {
    format!("{:012}-{:013}", seq.max(0), now.max(0))
}

fn operation_from_row(row: &SqliteRow) -> Option<PendingOperation> {
    let id: String = row.get("op_id");
    let kind_str: String = row.get("kind");
    let Some(kind) = OperationKind::parse(&kind_str) else {
        tracing::warn!(id = %id, kind = %kind_str, "skipping queued operation with unknown kind");
        return None;
    };
    let headers_json: String = row.get("headers_json");
    let headers: BTreeMap<String, String> = match serde_json::from_str(&headers_json) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(id = %id, "skipping queued operation with unreadable headers: {}", e);
            return None;
        }
    };
    let synced: i64 = row.get("synced");
    Some(PendingOperation {
        id,
        kind,
        endpoint: row.get("endpoint"),
        body: row.get("body"),
        headers,
        synced: synced != 0,
        created_at: row.get("created_at"),
        format_version: row.get("format_version"),
    })
}

impl OfflineStore {
    /// Append a write to the queue. Durable once this returns.
    pub async fn enqueue(
        &self,
        kind: OperationKind,
        endpoint: &str,
        body: Option<&[u8]>,
        headers: &BTreeMap<String, String>,
    ) -> Result<OperationId> {
        let headers_json = serde_json::to_string(headers)?;
        let _writer = self.write_lock.lock().await;
        let now = unix_millis();
        let mut tx = self.pool.begin().await?;

        // Next AUTOINCREMENT value; sqlite_sequence survives purges of old rows.
        let seq: i64 = sqlx::query_scalar(
            r#"
            SELECT MAX(
                COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'pending_operations'), 0),
                COALESCE((SELECT MAX(seq) FROM pending_operations), 0)
            ) + 1
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .context("allocate queue position")?;
        let id = operation_id(seq, now);

        sqlx::query(
            r#"
            INSERT INTO pending_operations (
                seq, op_id, kind, endpoint, body, headers_json,
                synced, created_at, synced_at, format_version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                      0, ?7, NULL, ?8)
            "#,
        )
        .bind(seq)
        .bind(&id)
        .bind(kind.as_str())
        .bind(endpoint)
        .bind(body)
        .bind(headers_json)
        .bind(now)
        .bind(OPERATION_FORMAT_VERSION)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("enqueue {} {}", kind.as_str(), endpoint))?;
        tx.commit().await?;

        tracing::info!(id = %id, kind = kind.as_str(), endpoint, "queued write for later sync");
        Ok(id)
    }

    /// Unsynced operations in the order they were enqueued.
    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>> {
        let rows = sqlx::query(
            r#"
            SELECT op_id, kind, endpoint, body, headers_json,
                   synced, created_at, format_version
            FROM pending_operations
            WHERE synced = 0
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(operation_from_row).collect())
    }

    /// Look up one operation, synced or not.
    pub async fn operation(&self, id: &str) -> Result<Option<PendingOperation>> {
        let row = sqlx::query(
            r#"
            SELECT op_id, kind, endpoint, body, headers_json,
                   synced, created_at, format_version
            FROM pending_operations
            WHERE op_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().and_then(operation_from_row))
    }

    /// Mark an operation as applied. Unknown or already-synced ids are a no-op.
    pub async fn mark_synced(&self, id: &str) -> Result<()> {
        let _writer = self.write_lock.lock().await;
        let r = sqlx::query(
            r#"
            UPDATE pending_operations
            SET synced = 1,
                synced_at = ?1
            WHERE op_id = ?2 AND synced = 0
            "#,
        )
        .bind(unix_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if r.rows_affected() == 0 {
            tracing::debug!(id, "mark_synced: nothing to update");
        }
        Ok(())
    }

    /// Remove cache entries and synced operations older than `max_age`.
    /// Unsynced operations are kept whatever their age.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<PurgeReport> {
        self.purge_before(unix_millis().saturating_sub(duration_millis(max_age)))
            .await
    }

    pub(crate) async fn purge_before(&self, cutoff: i64) -> Result<PurgeReport> {
        let _writer = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let cache = sqlx::query(
            r#"
            DELETE FROM cache_entries
            WHERE stored_at < ?1
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;
        let ops = sqlx::query(
            r#"
            DELETE FROM pending_operations
            WHERE synced = 1
              AND COALESCE(synced_at, created_at) < ?1
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let report = PurgeReport {
            cache_entries: cache.rows_affected(),
            synced_operations: ops.rows_affected(),
        };
        tracing::debug!(?report, "purged offline store");
        Ok(report)
    }

    /// Record the end of a sync pass. Returns the stored timestamp.
    pub async fn record_sync(&self) -> Result<i64> {
        let now = unix_millis();
        let _writer = self.write_lock.lock().await;
        sqlx::query(
            r#"
            INSERT INTO sync_meta (name, value)
            VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(LAST_SYNC)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(now)
    }

    /// Unix milliseconds of the last sync pass, if one ever ran.
    pub async fn last_sync(&self) -> Result<Option<i64>> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM sync_meta WHERE name = ?1")
                .bind(LAST_SYNC)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    pub async fn pending_write_count(&self) -> Result<u64> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pending_operations WHERE synced = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(n.max(0) as u64)
    }

    pub async fn statistics(&self) -> Result<CacheStatistics> {
        Ok(CacheStatistics {
            cached_read_count: self.cached_read_count().await?,
            pending_write_count: self.pending_write_count().await?,
            last_sync: self.last_sync().await?,
            is_online: self.is_online(),
        })
    }
}
