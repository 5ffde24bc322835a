use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::Middleware;
use crate::core::{Handler, Request, Response};
use crate::error::{DispatchError, WebError};

/// Catches panics in the wrapped handler and turns them into 500 errors
pub struct PanicRecoveryMiddleware;

impl PanicRecoveryMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PanicRecoveryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for PanicRecoveryMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let result = AssertUnwindSafe(next.handle(req)).catch_unwind().await;

        result.unwrap_or_else(|panic_info| {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(DispatchError::HandlerPanicked(panic_msg).into())
        })
    }
}
