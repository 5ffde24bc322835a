#![allow(clippy::module_inception)]
pub mod compression_middleware;
pub mod middleware;
pub mod panic_recovery_middleware;
pub mod tracing_middleware;

pub use compression_middleware::{CompressionAlgorithm, CompressionConfig, CompressionMiddleware};
pub use middleware::{Middleware, compose, wrap_with};
pub use panic_recovery_middleware::PanicRecoveryMiddleware;
pub use tracing_middleware::TracingMiddleware;
