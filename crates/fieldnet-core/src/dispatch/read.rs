use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::Dispatcher;
use crate::error::{ErrorKind, ErrorRecord};
use crate::transport::Method;

impl Dispatcher {
    /// GET `endpoint` under the api policy.
    ///
    /// With a `cache_key`, a successful body is cached. While offline a fresh
    /// cached copy is served without touching the network, and a failed fetch
    /// falls back to it. `max_age` of `None` accepts any cached age.
    pub async fn get(
        &self,
        endpoint: &str,
        cache_key: Option<&str>,
        max_age: Option<Duration>,
    ) -> Result<Vec<u8>, ErrorRecord> {
        if self.is_offline() {
            if let Some(hit) = self.cached(cache_key, max_age).await {
                tracing::debug!(endpoint, "offline: serving cached response");
                return Ok(hit);
            }
        }

        let result = self
            .send_with_retry(&self.presets.api, Method::Get, endpoint, None, &BTreeMap::new())
            .await;

        match result {
            Ok(body) => {
                if let Some(key) = cache_key {
                    self.store.cache(key, &body).await;
                }
                Ok(body)
            }
            Err(err) => {
                if self.is_offline() {
                    if let Some(hit) = self.cached(cache_key, max_age).await {
                        tracing::warn!(endpoint, kind = %err.kind(), "fetch failed offline, using cache");
                        return Ok(hit);
                    }
                }
                Err(err)
            }
        }
    }

    /// [`get`](Self::get) and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        cache_key: Option<&str>,
        max_age: Option<Duration>,
    ) -> Result<T, ErrorRecord> {
        let body = self.get(endpoint, cache_key, max_age).await?;
        serde_json::from_slice(&body).map_err(|e| {
            ErrorRecord::new(ErrorKind::Unknown, format!("decode response from {endpoint}: {e}"))
        })
    }

    async fn cached(&self, cache_key: Option<&str>, max_age: Option<Duration>) -> Option<Vec<u8>> {
        match cache_key {
            Some(key) => self.store.get_cached(key, max_age).await,
            None => None,
        }
    }
}
