#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Level used for a request line with the given status.
    pub fn for_status(status: u16) -> Self {
        match status {
            500..=u16::MAX => Level::Error,
            400..=499 => Level::Warn,
            _ => Level::Info,
        }
    }
}

/// Optional sink for request and lifecycle lines.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Writes plain lines to stderr, keeping stdout free for the application.
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        eprintln!("pingora_rest: level={:?} {}", level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_status_class() {
        assert_eq!(Level::for_status(200), Level::Info);
        assert_eq!(Level::for_status(304), Level::Info);
        assert_eq!(Level::for_status(405), Level::Warn);
        assert_eq!(Level::for_status(500), Level::Error);
        assert_eq!(Level::for_status(999), Level::Error);
    }

    #[test]
    fn stderr_logger_is_a_shared_sink() {
        let logger: std::sync::Arc<dyn Logger> = std::sync::Arc::new(StderrLogger);
        logger.log(Level::Warn, "[-] GET /items 405, method GET not supported");
    }
}
