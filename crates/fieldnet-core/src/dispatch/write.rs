use std::collections::BTreeMap;

use serde::Serialize;

use super::Dispatcher;
use crate::error::{ErrorKind, ErrorRecord};
use crate::store::{OperationId, OperationKind};

/// Result of a write that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The server accepted the write; carries the response body.
    Completed(Vec<u8>),
    /// The device is offline; the write was queued for the next sync.
    Queued(OperationId),
}

impl WriteOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, WriteOutcome::Queued(_))
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub headers: BTreeMap<String, String>,
    /// Queue the write when the device is offline. Disabled during replay.
    pub save_for_offline_sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            headers: BTreeMap::new(),
            save_for_offline_sync: true,
        }
    }
}

impl WriteOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn without_offline_save(mut self) -> Self {
        self.save_for_offline_sync = false;
        self
    }
}

impl Dispatcher {
    pub async fn post(&self, endpoint: &str, body: Option<&[u8]>) -> Result<WriteOutcome, ErrorRecord> {
        self.send_write(OperationKind::Post, endpoint, body, &WriteOptions::default())
            .await
    }

    pub async fn put(&self, endpoint: &str, body: Option<&[u8]>) -> Result<WriteOutcome, ErrorRecord> {
        self.send_write(OperationKind::Put, endpoint, body, &WriteOptions::default())
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<WriteOutcome, ErrorRecord> {
        self.send_write(OperationKind::Delete, endpoint, None, &WriteOptions::default())
            .await
    }

    /// POST `value` as a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        value: &T,
    ) -> Result<WriteOutcome, ErrorRecord> {
        let body = encode_json(value)?;
        let opts = WriteOptions::default().header("Content-Type", "application/json");
        self.send_write(OperationKind::Post, endpoint, Some(&body), &opts)
            .await
    }

    /// PUT `value` as a JSON body.
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        value: &T,
    ) -> Result<WriteOutcome, ErrorRecord> {
        let body = encode_json(value)?;
        let opts = WriteOptions::default().header("Content-Type", "application/json");
        self.send_write(OperationKind::Put, endpoint, Some(&body), &opts)
            .await
    }

    /// Generic write. With `save_for_offline_sync` set, the write is queued
    /// instead of failing when the device is offline before the attempt, or
    /// when the attempt failed for lack of connectivity. A status the server
    /// answered with (4xx, 5xx) always surfaces.
    pub async fn send_write(
        &self,
        kind: OperationKind,
        endpoint: &str,
        body: Option<&[u8]>,
        opts: &WriteOptions,
    ) -> Result<WriteOutcome, ErrorRecord> {
        if opts.save_for_offline_sync && self.is_offline() {
            let id = self.enqueue(kind, endpoint, body, &opts.headers).await?;
            return Ok(WriteOutcome::Queued(id));
        }

        let result = self
            .send_with_retry(&self.presets.api, kind.method(), endpoint, body, &opts.headers)
            .await;

        match result {
            Ok(response) => Ok(WriteOutcome::Completed(response)),
            Err(err)
                if opts.save_for_offline_sync
                    && self.is_offline()
                    && err.is_connectivity_failure() =>
            {
                tracing::info!(
                    endpoint,
                    kind = %err.kind(),
                    "write failed after connectivity loss, deferring"
                );
                let id = self.enqueue(kind, endpoint, body, &opts.headers).await?;
                Ok(WriteOutcome::Queued(id))
            }
            Err(err) => Err(err),
        }
    }

    async fn enqueue(
        &self,
        kind: OperationKind,
        endpoint: &str,
        body: Option<&[u8]>,
        headers: &BTreeMap<String, String>,
    ) -> Result<OperationId, ErrorRecord> {
        self.store
            .enqueue(kind, endpoint, body, headers)
            .await
            .map_err(|e| {
                tracing::error!(endpoint, error = %format!("{e:#}"), "could not queue write");
                ErrorRecord::new(ErrorKind::Unknown, format!("queue write: {e:#}"))
            })
    }
}

fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ErrorRecord> {
    serde_json::to_vec(value)
        .map_err(|e| ErrorRecord::new(ErrorKind::Unknown, format!("encode request body: {e}")))
}
