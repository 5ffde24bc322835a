use crate::core::{Handler, Request, Response};
use crate::{error::WebError, middleware::Middleware};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, info};

/// Opens a span per request so every event raised while handling it
/// carries the method, path and remote address.
#[derive(Clone)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let span = tracing::info_span!(
            "request",
            method = req.method().as_str(),
            path = req.path(),
            remote_addr = req.remote_addr().unwrap_or("-"),
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );
        let span_for_record = span.clone();

        async move {
            info!("request started");
            let start_time = std::time::Instant::now();

            let res = next.handle(req).await;

            let status = match &res {
                Ok(r) => r.status.as_u16(),
                Err(e) => e.status_code().as_u16(),
            };
            span_for_record.record("status", status);
            span_for_record.record("latency_ms", start_time.elapsed().as_millis() as u64);
            info!("request completed");

            res
        }
        .instrument(span)
        .await
    }
}
