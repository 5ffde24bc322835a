use std::time::Duration;

/// Operational parameters for serving an [`Api`](crate::Api).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on (default: all interfaces)
    pub host: String,
    /// Timeout for reading from a connection (default: 20 seconds)
    pub read_timeout: Duration,
    /// Timeout for writing to a connection (default: 20 seconds)
    pub write_timeout: Duration,
    /// Maximum size of the request line plus headers (default: 32KB)
    pub max_header_bytes: usize,
    /// Maximum request body size (default: 10MB)
    pub max_body_bytes: usize,
    /// Idle keepalive for reused connections, `None` to close after each request
    pub keepalive: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            read_timeout: Duration::from_secs(20),
            write_timeout: Duration::from_secs(20),
            max_header_bytes: 1 << 15,
            max_body_bytes: 10 << 20,
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn max_header_bytes(mut self, size: usize) -> Self {
        self.max_header_bytes = size;
        self
    }

    pub fn max_body_bytes(mut self, size: usize) -> Self {
        self.max_body_bytes = size;
        self
    }

    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.keepalive = idle;
        self
    }

    /// `host:port` address to bind.
    pub fn listen_addr(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(20));
        assert_eq!(config.write_timeout, Duration::from_secs(20));
        assert_eq!(config.max_header_bytes, 32 * 1024);
        assert_eq!(config.listen_addr(3000), "0.0.0.0:3000");
    }

    #[test]
    fn builder_overrides() {
        let config = ServerConfig::new()
            .host("127.0.0.1")
            .read_timeout(Duration::from_secs(5))
            .write_timeout(Duration::from_secs(7))
            .max_header_bytes(1024)
            .keepalive(None);
        assert_eq!(config.listen_addr(8080), "127.0.0.1:8080");
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(7));
        assert_eq!(config.max_header_bytes, 1024);
        assert!(config.keepalive.is_none());
    }
}
