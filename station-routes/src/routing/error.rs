//! Routing client error types.

use std::time::Duration;

/// Why a single route request failed.
#[derive(Debug, thiserror::Error)]
pub enum FailureCause {
    /// HTTP request failed (network error, client timeout, etc.)
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status code
    #[error("API error {status}: {message}")]
    BadResponse { status: u16, message: String },

    /// The body could not be decoded, or lacked the fields we need
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// The service could not connect the two points
    #[error("no route found")]
    NoRouteFound,

    /// No answer arrived within the per-request deadline
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

/// Error from a route request.
///
/// Every failure collapses to `Unavailable`; the cause is kept for logging
/// only. Callers treat all of them the same way: the destination stays
/// incomplete and may be retried later.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route unavailable: {0}")]
    Unavailable(#[from] FailureCause),
}

impl RouteError {
    pub fn cause(&self) -> &FailureCause {
        match self {
            RouteError::Unavailable(cause) => cause,
        }
    }
}

impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        RouteError::Unavailable(FailureCause::Network(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RouteError::from(FailureCause::NoRouteFound);
        assert_eq!(err.to_string(), "route unavailable: no route found");

        let err = RouteError::from(FailureCause::BadResponse {
            status: 502,
            message: "Bad Gateway".into(),
        });
        assert_eq!(err.to_string(), "route unavailable: API error 502: Bad Gateway");

        let err = RouteError::from(FailureCause::Malformed {
            message: "missing field `trip`".into(),
        });
        assert!(err.to_string().contains("malformed response"));
        assert!(matches!(err.cause(), FailureCause::Malformed { .. }));
    }

    #[test]
    fn timeout_display() {
        let err = RouteError::from(FailureCause::TimedOut(Duration::from_secs(10)));
        assert_eq!(err.to_string(), "route unavailable: request timed out after 10s");
    }
}
