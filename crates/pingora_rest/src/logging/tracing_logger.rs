use crate::logging::{Level, Logger};
use tracing::{debug, error, info, trace, warn};

/// A logger implementation that uses the tracing crate
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, msg: &str) {
        match level {
            Level::Error => error!(target: "pingora_rest", "{}", msg),
            Level::Warn => warn!(target: "pingora_rest", "{}", msg),
            Level::Info => info!(target: "pingora_rest", "{}", msg),
            Level::Debug => debug!(target: "pingora_rest", "{}", msg),
            Level::Trace => trace!(target: "pingora_rest", "{}", msg),
        }
    }
}
