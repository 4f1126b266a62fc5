//! Response cache: best-effort writes, staleness-checked reads.
//!
//! Cache failures never reach callers. They are logged and the cache behaves
//! as if the entry were missing.

use anyhow::Result;
use sqlx::Row;
use std::time::Duration;

use super::db::{duration_millis, unix_millis, OfflineStore};
use super::types::CacheEntry;

/// True when an entry stored at `stored_at` is still usable at `now`
/// (`now - stored_at <= max_age`). `None` means the entry never expires.
pub fn is_fresh(stored_at: i64, max_age: Option<Duration>, now: i64) -> bool {
    match max_age {
        None => true,
        Some(max_age) => now.saturating_sub(stored_at) <= duration_millis(max_age),
    }
}

impl OfflineStore {
    /// Create or overwrite the entry for `key`.
    pub async fn cache(&self, key: &str, payload: &[u8]) {
        if let Err(e) = self.cache_at(key, payload, unix_millis()).await {
            tracing::warn!(key, "cache write failed: {:#}", e);
        }
    }

    pub(crate) async fn cache_at(&self, key: &str, payload: &[u8], stored_at: i64) -> Result<()> {
        let _writer = self.write_lock.lock().await;
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, payload, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE
            SET payload = excluded.payload,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(stored_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Payload for `key` if present and not older than `max_age`.
    pub async fn get_cached(&self, key: &str, max_age: Option<Duration>) -> Option<Vec<u8>> {
        self.get_cached_at(key, max_age, unix_millis()).await
    }

    pub(crate) async fn get_cached_at(
        &self,
        key: &str,
        max_age: Option<Duration>,
        now: i64,
    ) -> Option<Vec<u8>> {
        let entry = match self.cache_entry(key).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(key, "cache read failed: {:#}", e);
                return None;
            }
        };
        if is_fresh(entry.stored_at, max_age, now) {
            Some(entry.payload)
        } else {
            tracing::debug!(key, stored_at = entry.stored_at, "cache entry stale");
            None
        }
    }

    /// Raw entry for `key`, regardless of age.
    pub async fn cache_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(
            r#"
            SELECT key, payload, stored_at
            FROM cache_entries
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| CacheEntry {
            key: row.get("key"),
            payload: row.get("payload"),
            stored_at: row.get("stored_at"),
        }))
    }

    /// Number of cached read responses.
    pub async fn cached_read_count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }
}
