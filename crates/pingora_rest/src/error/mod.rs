mod response_error;
mod web_error;

pub use response_error::ResponseError;
pub use web_error::WebError;

pub use crate::core::form::FormParseError;
pub use crate::core::router::RouteError;

use http::StatusCode;

/// Failures local to one request. Each maps to a fixed status with an
/// empty body; the message only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] FormParseError),
    #[error("method {method} not supported by this resource")]
    UnsupportedMethod { method: String },
    #[error("failed to encode response body: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("handler returned invalid status code {0}")]
    InvalidStatus(u16),
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),
}

impl ResponseError for DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::UnsupportedMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::Encoding(_)
            | DispatchError::InvalidStatus(_)
            | DispatchError::HandlerPanicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Misconfiguration detected at the call site, before any network I/O.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("you must add at least one resource to this API")]
    NoResources,
    #[error("a router is already bound to this API")]
    RouterAlreadyBound,
}

/// Terminal errors from starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_map_to_fixed_statuses() {
        let bad = DispatchError::from(FormParseError::Semicolon);
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let unsupported = DispatchError::UnsupportedMethod {
            method: "TRACE".to_string(),
        };
        assert_eq!(unsupported.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let invalid = DispatchError::InvalidStatus(7);
        assert_eq!(invalid.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(invalid.to_string(), "handler returned invalid status code 7");
    }

    #[test]
    fn error_responses_have_empty_bodies() {
        let res = DispatchError::HandlerPanicked("boom".to_string()).error_response();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body.is_empty());
    }
}
