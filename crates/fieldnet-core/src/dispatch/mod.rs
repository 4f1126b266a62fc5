//! Request dispatch: connectivity-aware reads and writes over a [`Transport`].
//!
//! Reads fall back to the offline cache, writes fall back to the offline
//! queue, and the sync runner replays the queue once the device is back online.

mod read;
mod sync;
mod write;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use crate::error::{Classify, ErrorRecord, Failure, Origin};
use crate::retry::{self, RetryPolicy, RetryPresets};
use crate::store::{CacheStatistics, OfflineStore};
use crate::transport::{Method, Request, Transport};

pub use sync::{spawn_sync_on_reconnect, SyncReport};
pub use write::{WriteOptions, WriteOutcome};

/// Entry point for every request the application makes.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    store: OfflineStore,
    base_url: Url,
    first_party_hosts: Vec<String>,
    presets: RetryPresets,
    /// Serializes sync passes.
    sync_guard: tokio::sync::Mutex<()>,
}

impl Dispatcher {
    /// `base_url` is the first-party backend root; relative endpoints are joined onto it.
    pub fn new(transport: Arc<dyn Transport>, store: OfflineStore, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
        Ok(Self {
            transport,
            store,
            base_url,
            first_party_hosts: Vec::new(),
            presets: RetryPresets::default(),
            sync_guard: tokio::sync::Mutex::new(()),
        })
    }

    pub fn with_presets(mut self, presets: RetryPresets) -> Self {
        self.presets = presets;
        self
    }

    /// Additional hosts (besides the base url's) operated by us.
    pub fn with_first_party_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.first_party_hosts = hosts
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn store(&self) -> &OfflineStore {
        &self.store
    }

    pub fn presets(&self) -> &RetryPresets {
        &self.presets
    }

    pub fn is_online(&self) -> bool {
        self.store.is_online()
    }

    pub fn is_offline(&self) -> bool {
        self.store.is_offline()
    }

    pub async fn cache_statistics(&self) -> Result<CacheStatistics> {
        self.store.statistics().await
    }

    /// Absolute URL for `endpoint` and whether it points at our own backend.
    pub fn resolve(&self, endpoint: &str) -> Result<(Url, Origin), ErrorRecord> {
        let url = self.base_url.join(endpoint).map_err(|e| {
            Failure::InvalidRequest(format!("cannot resolve endpoint {endpoint:?}: {e}")).classify()
        })?;
        let origin = self.origin_of(&url);
        Ok((url, origin))
    }

    fn origin_of(&self, url: &Url) -> Origin {
        let host = match url.host_str() {
            Some(h) => h.to_ascii_lowercase(),
            None => return Origin::ThirdParty,
        };
        let own = self
            .base_url
            .host_str()
            .is_some_and(|base| base.eq_ignore_ascii_case(&host));
        if own || self.first_party_hosts.iter().any(|h| *h == host) {
            Origin::FirstParty
        } else {
            Origin::ThirdParty
        }
    }

    /// Send one request under `policy`. Success is a 2xx body.
    pub(crate) async fn send_with_retry(
        &self,
        policy: &RetryPolicy,
        method: Method,
        endpoint: &str,
        body: Option<&[u8]>,
        headers: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ErrorRecord> {
        let (url, origin) = self.resolve(endpoint)?;
        let request = Request {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(<[u8]>::to_vec),
        };
        tracing::debug!(%method, url = %request.url, "dispatching request");

        retry::execute(policy, || {
            let request = request.clone();
            async move { self.attempt(request, origin).await }
        })
        .await
    }

    async fn attempt(&self, request: Request, origin: Origin) -> Result<Vec<u8>, Failure> {
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => Ok(response.body),
            Ok(response) => Err(Failure::Status {
                code: response.status,
                body: response.body,
                origin,
            }),
            Err(e) if self.store.is_offline() => {
                tracing::debug!(error = %e, "transport failed while offline");
                Err(Failure::NoConnectivity)
            }
            Err(e) => Err(Failure::Transport(e)),
        }
    }
}
