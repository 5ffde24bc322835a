use async_trait::async_trait;
use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use std::sync::Arc;

use super::Middleware;
use crate::core::{Handler, Request, Response};
use crate::error::WebError;

/// Compression algorithms supported by the middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// Gzip compression (widely supported, good compression)
    Gzip,
}

impl CompressionAlgorithm {
    fn encoding_name(&self) -> &'static str {
        match self {
            CompressionAlgorithm::Gzip => "gzip",
        }
    }
}

/// Configuration for compression middleware
#[derive(Clone)]
pub struct CompressionConfig {
    /// Compression level (0-9)
    pub level: u32,
    /// Minimum response size to compress (bytes)
    pub min_size: usize,
    /// Supported algorithms in order of preference
    pub algorithms: Vec<CompressionAlgorithm>,
    /// Content type prefixes that should be compressed
    pub compress_types: Vec<String>,
    /// Whether to enable content type filtering (if false, compress all content types)
    pub filter_content_types: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: 6,
            min_size: 1024,
            algorithms: vec![CompressionAlgorithm::Gzip],
            compress_types: vec![
                "application/json".to_string(),
                "application/problem+json".to_string(),
                "text/".to_string(),
            ],
            filter_content_types: true,
        }
    }
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression level (0-9)
    pub fn level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Set minimum size threshold for compression
    pub fn min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Add a content type prefix that should be compressed
    pub fn compress_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.compress_types.push(content_type.into());
        self
    }

    /// Set the list of compression algorithms in order of preference
    pub fn algorithms(mut self, algorithms: Vec<CompressionAlgorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Enable or disable content type filtering
    pub fn filter_content_types(mut self, filter: bool) -> Self {
        self.filter_content_types = filter;
        self
    }

    /// Disable content type filtering (compress all types)
    pub fn compress_all_types(mut self) -> Self {
        self.filter_content_types = false;
        self
    }
}

/// Gzip-compresses encoded replies. Meant to be installed per resource
/// through `wrap_with`; error responses pass through untouched.
pub struct CompressionMiddleware {
    config: CompressionConfig,
}

impl CompressionMiddleware {
    /// Create new compression middleware with default configuration
    pub fn new() -> Self {
        Self {
            config: CompressionConfig::default(),
        }
    }

    /// Create new compression middleware with custom configuration
    pub fn with_config(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// Check if the client accepts the given encoding
    fn accepts_encoding(&self, req: &Request, encoding: &str) -> bool {
        req.headers()
            .get_all(http::header::ACCEPT_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|accept| accept.split(','))
            .map(|enc| enc.split(';').next().unwrap_or("").trim())
            .any(|enc| enc.eq_ignore_ascii_case(encoding) || enc == "*")
    }

    /// Choose the best compression algorithm based on client support
    fn choose_algorithm(&self, req: &Request) -> Option<CompressionAlgorithm> {
        self.config
            .algorithms
            .iter()
            .find(|&&algorithm| self.accepts_encoding(req, algorithm.encoding_name()))
            .copied()
    }

    /// Check if the content type should be compressed
    fn should_compress_content_type(&self, content_type: &str) -> bool {
        if !self.config.filter_content_types || self.config.compress_types.is_empty() {
            return true;
        }
        self.config
            .compress_types
            .iter()
            .any(|pattern| content_type.starts_with(pattern.as_str()))
    }

    /// Check if the response (alone) allows compression according to config
    fn response_allows_compress(&self, res: &Response) -> bool {
        if res.headers.contains_key(http::header::CONTENT_ENCODING) {
            return false;
        }

        match res.headers.get(http::header::CONTENT_TYPE) {
            Some(content_type) => match content_type.to_str() {
                Ok(ct) if self.should_compress_content_type(ct) => {}
                _ => return false,
            },
            None if self.config.filter_content_types => return false,
            None => {}
        }

        res.body.len() >= self.config.min_size
    }

    /// Compress byte data using the specified algorithm
    fn compress_bytes(
        &self,
        data: &[u8],
        algorithm: CompressionAlgorithm,
    ) -> Result<Vec<u8>, std::io::Error> {
        match algorithm {
            CompressionAlgorithm::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.config.level));
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }
}

impl Default for CompressionMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for CompressionMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        // Pre-compute the best algorithm from the request, then move request downstream
        let algo = self.choose_algorithm(&req);
        let mut response = next.handle(req).await?;

        if let Some(algorithm) = algo.filter(|_| self.response_allows_compress(&response)) {
            match self.compress_bytes(&response.body, algorithm) {
                Ok(compressed) => {
                    response.body = bytes::Bytes::from(compressed);
                    response.headers.insert(
                        http::header::CONTENT_ENCODING,
                        http::HeaderValue::from_static(algorithm.encoding_name()),
                    );
                    response.headers.append(
                        http::header::VARY,
                        http::HeaderValue::from_static("Accept-Encoding"),
                    );
                    // Compression changes the size
                    response.headers.remove(http::header::CONTENT_LENGTH);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "response compression failed, sending identity");
                }
            }
        }

        Ok(response)
    }
}
