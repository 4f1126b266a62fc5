use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// No transport reachable (DNS failure, connection refused, no route).
    Network,
    /// The device itself reports no connectivity.
    NoInternet,
    /// Connect/read deadline or per-attempt timeout exceeded.
    Timeout,
    /// 5xx from a first-party endpoint, or the server dropped the exchange.
    ServerError,
    /// Application-level error from an API (4xx, or throttling from a third party).
    Api,
    /// 401: credentials missing or rejected.
    Authentication,
    /// 403: authenticated but not allowed.
    Permission,
    /// 400/422: the request payload was rejected.
    Validation,
    /// The request could not be built (bad endpoint, bad base URL).
    Configuration,
    /// Anything not mapped above.
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::Network,
        ErrorKind::NoInternet,
        ErrorKind::Timeout,
        ErrorKind::ServerError,
        ErrorKind::Api,
        ErrorKind::Authentication,
        ErrorKind::Permission,
        ErrorKind::Validation,
        ErrorKind::Configuration,
        ErrorKind::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::NoInternet => "noInternet",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ServerError => "serverError",
            ErrorKind::Api => "api",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Permission => "permission",
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Retryability when no status code is known.
    pub fn retryable_by_default(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::NoInternet | ErrorKind::Timeout | ErrorKind::ServerError
        )
    }

    /// Retryability for this kind given the originating HTTP status, if any.
    ///
    /// `Api` errors are only worth retrying on the throttling / server-fault
    /// status paths (429, 5xx); every other kind ignores the status.
    pub fn is_retryable(self, status: Option<u16>) -> bool {
        match self {
            ErrorKind::Api => matches!(status, Some(429) | Some(500..=599)),
            kind => kind.retryable_by_default(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_retry_by_default() {
        let retryable: Vec<_> = ErrorKind::ALL
            .into_iter()
            .filter(|k| k.retryable_by_default())
            .collect();
        assert_eq!(
            retryable,
            vec![
                ErrorKind::Network,
                ErrorKind::NoInternet,
                ErrorKind::Timeout,
                ErrorKind::ServerError
            ]
        );
    }

    #[test]
    fn api_retries_only_on_throttle_and_server_codes() {
        assert!(ErrorKind::Api.is_retryable(Some(429)));
        assert!(ErrorKind::Api.is_retryable(Some(500)));
        assert!(ErrorKind::Api.is_retryable(Some(503)));
        assert!(!ErrorKind::Api.is_retryable(Some(404)));
        assert!(!ErrorKind::Api.is_retryable(None));
    }

    #[test]
    fn status_does_not_make_validation_retryable() {
        assert!(!ErrorKind::Validation.is_retryable(Some(500)));
        assert!(ErrorKind::Timeout.is_retryable(Some(408)));
    }

    #[test]
    fn serde_uses_camel_case_names() {
        let json = serde_json::to_string(&ErrorKind::NoInternet).unwrap();
        assert_eq!(json, "\"noInternet\"");
        for kind in ErrorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json.trim_matches('"'), kind.as_str());
        }
    }
}
