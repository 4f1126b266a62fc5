use thiserror::Error;

/// Transport-level failure (no HTTP status available).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connect or transfer deadline exceeded.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Host or proxy name could not be resolved.
    #[error("dns: {0}")]
    Dns(String),
    /// TCP connect failed (refused, unreachable).
    #[error("connect: {0}")]
    Connect(String),
    /// Connection dropped mid-exchange (reset, empty reply, short read).
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    /// The request could not be issued as built (malformed URL, bad scheme).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(String),
}
