//! HTTP transport seam.
//!
//! The request layer only needs "send a request, get status + body or an
//! error". [`Transport`] is that primitive; [`CurlTransport`] implements it
//! on libcurl, and tests substitute scripted stubs.

mod easy;
mod error;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

pub use easy::CurlTransport;
pub use error::TransportError;

/// HTTP method used by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved request (absolute URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Status and body of a completed exchange, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request. Non-2xx statuses are returned as `Ok(Response)`;
/// `Err` is reserved for failures where no status was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}
