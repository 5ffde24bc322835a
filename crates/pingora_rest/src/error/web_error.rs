use super::{DispatchError, ResponseError};
use crate::core::Response;
use http::StatusCode;

/// Error type returned by handlers and middleware.
///
/// This type wraps any ResponseError so wrappers can fail with their own
/// error types.
#[derive(Debug)]
pub struct WebError {
    inner: Box<dyn ResponseError>,
}

impl WebError {
    /// Create a new WebError from any ResponseError
    #[track_caller]
    pub fn new<T: ResponseError + 'static>(err: T) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    /// Get a reference to the underlying ResponseError
    pub fn as_response_error(&self) -> &dyn ResponseError {
        &*self.inner
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    /// Convert this error into an HTTP response
    pub fn into_response(self) -> Response {
        tracing::debug!(
            status_code = %self.inner.status_code(),
            error = %self.inner,
            "request failed",
        );
        self.inner.error_response()
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<DispatchError> for WebError {
    #[track_caller]
    fn from(err: DispatchError) -> Self {
        Self::new(err)
    }
}

// Implement ResponseError for WebError to allow nested errors
impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    fn error_response(&self) -> Response {
        self.inner.error_response()
    }
}
