//! Scripted in-process transport.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldnet_core::connectivity::{Connectivity, ConnectivityMonitor};
use fieldnet_core::transport::{Request, Response, Transport, TransportError};

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, Vec<u8>),
    Fail(TransportError),
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Status(200, body.as_bytes().to_vec())
    }
}

/// Pops scripted replies in order, then answers `200 {}`. Paths registered
/// with [`StubTransport::fail_path`] always get the given status.
#[derive(Default)]
pub struct StubTransport {
    script: Mutex<VecDeque<Reply>>,
    failing_paths: Mutex<HashMap<String, u16>>,
    drop_link: Mutex<Option<(Arc<ConnectivityMonitor>, Reply)>>,
    requests: Mutex<Vec<Request>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn fail_path(&self, path: &str, status: u16) {
        self.failing_paths
            .lock()
            .unwrap()
            .insert(path.to_string(), status);
    }

    /// Next send flips `monitor` offline and fails with a connect error.
    pub fn drop_link_on_next_send(&self, monitor: Arc<ConnectivityMonitor>) {
        let reply = Reply::Fail(TransportError::Connect("network is unreachable".into()));
        self.go_offline_then_reply(monitor, reply);
    }

    /// Next send flips `monitor` offline, then answers with `reply`.
    pub fn go_offline_then_reply(&self, monitor: Arc<ConnectivityMonitor>, reply: Reply) {
        *self.drop_link.lock().unwrap() = Some((monitor, reply));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Paths of recorded requests, in send order.
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                url::Url::parse(&r.url)
                    .map(|u| u.path().to_string())
                    .unwrap_or_else(|_| r.url.clone())
            })
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let path = url::Url::parse(&request.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let dropped = self.drop_link.lock().unwrap().take();
        if let Some((monitor, reply)) = dropped {
            monitor.set(Connectivity::Offline);
            return match reply {
                Reply::Status(status, body) => Ok(Response { status, body }),
                Reply::Fail(e) => Err(e),
            };
        }
        if let Some(status) = self.failing_paths.lock().unwrap().get(&path) {
            return Ok(Response {
                status: *status,
                body: br#"{"message":"rejected"}"#.to_vec(),
            });
        }
        match self.script.lock().unwrap().pop_front() {
            Some(Reply::Status(status, body)) => Ok(Response { status, body }),
            Some(Reply::Fail(e)) => Err(e),
            None => Ok(Response {
                status: 200,
                body: b"{}".to_vec(),
            }),
        }
    }
}
