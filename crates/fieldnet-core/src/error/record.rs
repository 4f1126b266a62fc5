use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::kind::ErrorKind;

/// Classified failure handed back to callers.
///
/// Retryability is derived from the kind (and status code for `Api`) when the
/// record is built; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(from = "StoredRecord")]
#[error("{kind}: {message}")]
pub struct ErrorRecord {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    source_status_code: Option<u16>,
}

impl ErrorRecord {
    /// Record without an HTTP status.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(None),
            source_status_code: None,
        }
    }

    /// Record produced from an HTTP response status.
    pub fn with_status(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(Some(status)),
            source_status_code: Some(status),
        }
    }

    pub fn no_internet() -> Self {
        Self::new(ErrorKind::NoInternet, "device reports no connectivity")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn status_code(&self) -> Option<u16> {
        self.source_status_code
    }

    /// The request never got a verdict from the server: the link failed,
    /// timed out locally or dropped mid-exchange.
    pub fn is_connectivity_failure(&self) -> bool {
        self.source_status_code.is_none()
            && matches!(
                self.kind,
                ErrorKind::NoInternet
                    | ErrorKind::Network
                    | ErrorKind::Timeout
                    | ErrorKind::ServerError
            )
    }
}

/// Serialized form. `retryable` is recomputed on load, never trusted.
#[derive(Deserialize)]
struct StoredRecord {
    kind: ErrorKind,
    message: String,
    #[serde(default)]
    source_status_code: Option<u16>,
}

impl From<StoredRecord> for ErrorRecord {
    fn from(stored: StoredRecord) -> Self {
        match stored.source_status_code {
            Some(code) => ErrorRecord::with_status(stored.kind, code, stored.message),
            None => ErrorRecord::new(stored.kind, stored.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_follows_kind() {
        assert!(ErrorRecord::new(ErrorKind::Timeout, "slow").is_retryable());
        assert!(!ErrorRecord::new(ErrorKind::Validation, "bad").is_retryable());
        assert!(ErrorRecord::no_internet().is_retryable());
    }

    #[test]
    fn status_is_kept_and_gates_api_retry() {
        let throttled = ErrorRecord::with_status(ErrorKind::Api, 429, "slow down");
        assert_eq!(throttled.status_code(), Some(429));
        assert!(throttled.is_retryable());

        let missing = ErrorRecord::with_status(ErrorKind::Api, 404, "no such crop");
        assert!(!missing.is_retryable());
    }

    #[test]
    fn loaded_record_recomputes_retryable() {
        let json = r#"{"kind":"validation","message":"bad","retryable":true,"source_status_code":422}"#;
        let err: ErrorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), Some(422));
        assert!(!err.is_retryable());

        let json = r#"{"kind":"api","message":"busy","retryable":false,"source_status_code":503}"#;
        let err: ErrorRecord = serde_json::from_str(json).unwrap();
        assert!(err.is_retryable());
    }

    #[test]
    fn connectivity_failures_have_no_status() {
        assert!(ErrorRecord::no_internet().is_connectivity_failure());
        assert!(ErrorRecord::new(ErrorKind::Network, "refused").is_connectivity_failure());
        assert!(ErrorRecord::new(ErrorKind::ServerError, "reset").is_connectivity_failure());
        assert!(!ErrorRecord::with_status(ErrorKind::Validation, 422, "bad").is_connectivity_failure());
        assert!(!ErrorRecord::with_status(ErrorKind::Timeout, 408, "slow").is_connectivity_failure());
        assert!(!ErrorRecord::with_status(ErrorKind::ServerError, 503, "down").is_connectivity_failure());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = ErrorRecord::new(ErrorKind::Permission, "not your farm");
        assert_eq!(err.to_string(), "permission: not your farm");
    }
}
