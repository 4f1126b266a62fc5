//! Classify HTTP statuses, transport errors and deadlines into error records.

use std::time::Duration;

use super::kind::ErrorKind;
use super::record::ErrorRecord;
use crate::transport::TransportError;

/// Who operates the endpoint. Throttling and 5xx from our own backend are
/// server errors; the same codes from a third-party API are `Api` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    FirstParty,
    ThirdParty,
}

/// Raw failure as produced by one request attempt, before classification.
#[derive(Debug, Clone)]
pub enum Failure {
    /// The server answered with a non-2xx status.
    Status {
        code: u16,
        body: Vec<u8>,
        origin: Origin,
    },
    /// The transport failed before a status was available.
    Transport(TransportError),
    /// The per-attempt deadline elapsed.
    AttemptTimedOut(Duration),
    /// The device reported no connectivity when the attempt failed.
    NoConnectivity,
    /// The request could not be constructed.
    InvalidRequest(String),
}

/// Anything the retry engine can turn into an [`ErrorRecord`].
pub trait Classify {
    fn classify(&self) -> ErrorRecord;
}

impl Classify for Failure {
    fn classify(&self) -> ErrorRecord {
        classify(self)
    }
}

impl Classify for ErrorRecord {
    fn classify(&self) -> ErrorRecord {
        self.clone()
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(code: u16, origin: Origin) -> ErrorKind {
    match code {
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Permission,
        400 | 422 => ErrorKind::Validation,
        408 => ErrorKind::Timeout,
        429 | 500 | 502 | 503 | 504 => match origin {
            Origin::FirstParty => ErrorKind::ServerError,
            Origin::ThirdParty => ErrorKind::Api,
        },
        500..=599 => ErrorKind::ServerError,
        400..=499 => ErrorKind::Api,
        _ => ErrorKind::Unknown,
    }
}

/// Map a transport error to an error kind.
pub fn classify_transport_error(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Timeout(_) => ErrorKind::Timeout,
        TransportError::Dns(_) | TransportError::Connect(_) => ErrorKind::Network,
        TransportError::ConnectionLost(_) => ErrorKind::ServerError,
        TransportError::InvalidRequest(_) => ErrorKind::Configuration,
        TransportError::Other(_) => ErrorKind::Unknown,
    }
}

/// Classify a failure. Total: anything unmapped becomes `Unknown`.
pub fn classify(failure: &Failure) -> ErrorRecord {
    match failure {
        Failure::Status { code, body, origin } => {
            let kind = classify_http_status(*code, *origin);
            ErrorRecord::with_status(kind, *code, status_message(*code, body))
        }
        Failure::Transport(e) => ErrorRecord::new(classify_transport_error(e), e.to_string()),
        Failure::AttemptTimedOut(d) => ErrorRecord::new(
            ErrorKind::Timeout,
            format!("attempt timed out after {} ms", d.as_millis()),
        ),
        Failure::NoConnectivity => ErrorRecord::no_internet(),
        Failure::InvalidRequest(msg) => ErrorRecord::new(ErrorKind::Configuration, msg.clone()),
    }
}

const MAX_BODY_SNIPPET: usize = 200;

/// Prefer a `message`/`error`/`detail` string from a JSON body, else a
/// truncated text snippet, else just the status line.
fn status_message(code: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for field in ["message", "error", "detail"] {
            if let Some(s) = value.get(field).and_then(|v| v.as_str()) {
                return format!("HTTP {code}: {s}");
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return format!("HTTP {code}");
    }
    let snippet: String = text.chars().take(MAX_BODY_SNIPPET).collect();
    format!("HTTP {code}: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, origin: Origin) -> ErrorRecord {
        classify(&Failure::Status {
            code,
            body: Vec::new(),
            origin,
        })
    }

    #[test]
    fn auth_and_permission_codes() {
        assert_eq!(
            classify_http_status(401, Origin::FirstParty),
            ErrorKind::Authentication
        );
        assert_eq!(
            classify_http_status(403, Origin::ThirdParty),
            ErrorKind::Permission
        );
    }

    #[test]
    fn validation_codes_not_retryable() {
        for code in [400, 422] {
            let rec = status(code, Origin::FirstParty);
            assert_eq!(rec.kind(), ErrorKind::Validation);
            assert!(!rec.is_retryable());
        }
    }

    #[test]
    fn throttle_and_5xx_depend_on_origin_but_always_retry() {
        for code in [429, 500, 502, 503, 504] {
            let own = status(code, Origin::FirstParty);
            assert_eq!(own.kind(), ErrorKind::ServerError);
            assert!(own.is_retryable(), "first-party {code}");

            let third = status(code, Origin::ThirdParty);
            assert_eq!(third.kind(), ErrorKind::Api);
            assert!(third.is_retryable(), "third-party {code}");
        }
    }

    #[test]
    fn other_4xx_is_api_and_final() {
        let rec = status(404, Origin::ThirdParty);
        assert_eq!(rec.kind(), ErrorKind::Api);
        assert!(!rec.is_retryable());
        assert_eq!(rec.status_code(), Some(404));
    }

    #[test]
    fn odd_statuses_fall_back() {
        assert_eq!(classify_http_status(507, Origin::ThirdParty), ErrorKind::ServerError);
        assert_eq!(classify_http_status(302, Origin::FirstParty), ErrorKind::Unknown);
        assert!(!status(302, Origin::FirstParty).is_retryable());
    }

    #[test]
    fn transport_errors() {
        let dns = classify(&Failure::Transport(TransportError::Dns("no host".into())));
        assert_eq!(dns.kind(), ErrorKind::Network);
        assert!(dns.is_retryable());

        let timeout = classify(&Failure::Transport(TransportError::Timeout("read".into())));
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let dropped = classify(&Failure::Transport(TransportError::ConnectionLost(
            "reset".into(),
        )));
        assert_eq!(dropped.kind(), ErrorKind::ServerError);

        let other = classify(&Failure::Transport(TransportError::Other("tls".into())));
        assert_eq!(other.kind(), ErrorKind::Unknown);
        assert!(!other.is_retryable());
    }

    #[test]
    fn deadline_and_offline() {
        let rec = classify(&Failure::AttemptTimedOut(Duration::from_millis(1500)));
        assert_eq!(rec.kind(), ErrorKind::Timeout);
        assert!(rec.message().contains("1500"));
        assert_eq!(classify(&Failure::NoConnectivity).kind(), ErrorKind::NoInternet);
    }

    #[test]
    fn json_message_is_extracted() {
        let rec = classify(&Failure::Status {
            code: 422,
            body: br#"{"message":"crop name required"}"#.to_vec(),
            origin: Origin::FirstParty,
        });
        assert_eq!(rec.message(), "HTTP 422: crop name required");
    }

    #[test]
    fn long_text_body_is_truncated() {
        let rec = classify(&Failure::Status {
            code: 500,
            body: vec![b'x'; 1000],
            origin: Origin::FirstParty,
        });
        assert!(rec.message().len() < 300);
    }
}
