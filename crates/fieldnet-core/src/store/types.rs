//! Records kept by the offline store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transport::Method;

/// Queue entry identifier: persistent queue position plus creation time in ms.
/// Sorts in creation order and never changes for the life of the operation.
pub type OperationId = String;

/// Replay format of queued operations. Bump when the row layout changes meaning.
pub const OPERATION_FORMAT_VERSION: i64 = 1;

/// Mutating request kinds that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Post,
    Put,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Post => "POST",
            OperationKind::Put => "PUT",
            OperationKind::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "POST" => Some(OperationKind::Post),
            "PUT" => Some(OperationKind::Put),
            "DELETE" => Some(OperationKind::Delete),
            _ => None,
        }
    }

    pub fn method(self) -> Method {
        match self {
            OperationKind::Post => Method::Post,
            OperationKind::Put => Method::Put,
            OperationKind::Delete => Method::Delete,
        }
    }
}

/// Cached read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    /// Unix milliseconds.
    pub stored_at: i64,
}

/// Write deferred until connectivity returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub id: OperationId,
    pub kind: OperationKind,
    pub endpoint: String,
    pub body: Option<Vec<u8>>,
    pub headers: BTreeMap<String, String>,
    pub synced: bool,
    /// Unix milliseconds.
    pub created_at: i64,
    pub format_version: i64,
}

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    pub cached_read_count: u64,
    pub pending_write_count: u64,
    /// Unix milliseconds of the last completed sync pass, if any.
    pub last_sync: Option<i64>,
    pub is_online: bool,
}

/// Rows removed by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub cache_entries: u64,
    pub synced_operations: u64,
}
