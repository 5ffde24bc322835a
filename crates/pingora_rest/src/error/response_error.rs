use crate::core::Response;
use http::StatusCode;

/// Trait for converting errors into HTTP responses
pub trait ResponseError: std::error::Error + Send + Sync {
    /// Return the HTTP status code for this error.
    ///
    /// The default implementation returns 500 Internal Server Error.
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Generate an HTTP response for this error.
    ///
    /// The default implementation carries the status only. Error details
    /// are logged, never sent to the client.
    fn error_response(&self) -> Response {
        Response::empty(self.status_code())
    }
}
