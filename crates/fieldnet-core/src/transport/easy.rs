//! libcurl-backed transport.
//!
//! Each request uses its own easy handle and runs on the blocking pool so the
//! async callers are never stalled on socket I/O.

use async_trait::async_trait;
use std::time::Duration;

use super::{Method, Request, Response, Transport, TransportError};

/// Transport on the curl crate's easy interface.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_secs(30))
    }
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let connect_timeout = self.connect_timeout;
        let request_timeout = self.request_timeout;
        tokio::task::spawn_blocking(move || perform(&request, connect_timeout, request_timeout))
            .await
            .map_err(|e| TransportError::Other(format!("transfer task failed: {e}")))?
    }
}

fn perform(
    request: &Request,
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Response, TransportError> {
    let err = |e: curl::Error| map_curl_error(&e);
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url).map_err(err)?;
    easy.follow_location(true).map_err(err)?;
    easy.connect_timeout(connect_timeout).map_err(err)?;
    easy.timeout(request_timeout).map_err(err)?;

    match request.method {
        Method::Get => easy.get(true).map_err(err)?,
        Method::Post => easy.post(true).map_err(err)?,
        Method::Put | Method::Delete => easy.custom_request(request.method.as_str()).map_err(err)?,
    }
    if let Some(payload) = &request.body {
        easy.post_fields_copy(payload).map_err(err)?;
    } else if request.method == Method::Post {
        easy.post_field_size(0).map_err(err)?;
    }

    // Build curl list for headers ("Name: value").
    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))
            .map_err(err)?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list).map_err(err)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(err)?;
        transfer.perform().map_err(err)?;
    }

    let status = easy.response_code().map_err(err)? as u16;
    tracing::debug!(method = %request.method, url = %request.url, status, "http exchange");
    Ok(Response { status, body })
}

/// Map a curl error onto the transport error taxonomy.
pub(crate) fn map_curl_error(e: &curl::Error) -> TransportError {
    let msg = e.to_string();
    if e.is_operation_timedout() {
        return TransportError::Timeout(msg);
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportError::Dns(msg);
    }
    if e.is_couldnt_connect() {
        return TransportError::Connect(msg);
    }
    if e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return TransportError::ConnectionLost(msg);
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportError::InvalidRequest(msg);
    }
    TransportError::Other(msg)
}
