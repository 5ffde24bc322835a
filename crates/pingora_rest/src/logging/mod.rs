pub mod logger;
pub mod request_line;
pub mod tracing_logger;

pub use logger::{Level, Logger, StderrLogger};
pub use request_line::RequestLine;
pub use tracing_logger::TracingLogger;
