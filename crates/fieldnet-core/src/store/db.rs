//! SQLite-backed store handle.
//!
//! Handles connection, migrations, and timestamp helpers. Cache and queue
//! operations live in `cache` and `queue`.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::connectivity::ConnectivityHandle;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the offline store.
///
/// The database file lives under the XDG state directory:
/// `~/.local/state/fieldnet/offline.db`. Clones share the pool, the writer
/// lock and the connectivity handle.
#[derive(Clone)]
pub struct OfflineStore {
    pub(crate) pool: Pool<Sqlite>,
    pub(crate) connectivity: ConnectivityHandle,
    /// Serializes writers (enqueue, mark_synced, purge, cache writes).
    pub(crate) write_lock: Arc<Mutex<()>>,
}

impl OfflineStore {
    /// Open (or create) the default store and run migrations.
    pub async fn open_default(connectivity: ConnectivityHandle) -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("fieldnet")?;
        let db_path = xdg_dirs.get_state_home().join("offline.db");
        Self::open_at(db_path, connectivity).await
    }

    /// Open (or create) the store at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>, connectivity: ConnectivityHandle) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open offline store: {}", path.display()))?;
        Self::from_pool(pool, connectivity).await
    }

    /// Open a private in-memory store (tests, throwaway sessions). Nothing survives drop.
    pub async fn open_in_memory(connectivity: ConnectivityHandle) -> Result<Self> {
        // Single connection: each new in-memory connection would be a different empty DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool, connectivity).await
    }

    async fn from_pool(pool: Pool<Sqlite>, connectivity: ConnectivityHandle) -> Result<Self> {
        let store = OfflineStore {
            pool,
            connectivity,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        // - `cache_entries` is keyed by logical resource; a write replaces the row.
        // - `pending_operations.seq` gives FIFO order; `op_id` is the stable external id.
        // - `sync_meta` holds scalar markers such as `last_sync`.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                stored_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pending_operations (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                op_id TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                body BLOB,
                headers_json TEXT NOT NULL DEFAULT '{}',
                synced INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                synced_at INTEGER,
                format_version INTEGER NOT NULL DEFAULT 1
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_pending_unsynced
            ON pending_operations (synced, seq);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_meta (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn connectivity(&self) -> &ConnectivityHandle {
        &self.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn is_offline(&self) -> bool {
        self.connectivity.is_offline()
    }
}

/// Current time as Unix milliseconds.
pub(crate) fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Milliseconds in `d`, saturating at `i64::MAX`.
pub(crate) fn duration_millis(d: std::time::Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
