use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Method, Request, Response};
use crate::error::WebError;

mod exact;
mod param;
mod pattern;

pub use exact::ExactRouter;
pub use param::ParamRouter;
pub use pattern::PatternRouter;

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process the request and return a response or error
    async fn handle(&self, req: Request) -> Result<Response, WebError>;
}

/// Errors raised while registering routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route pattern {path:?}: {reason}")]
    InvalidPattern { path: String, reason: String },
    #[error("resource supports no HTTP verb")]
    NoEntryPoints,
    #[error("resource registered without any path")]
    NoPaths,
}

impl RouteError {
    pub(crate) fn invalid(path: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Path routing capability, implemented once per routing strategy.
///
/// Routes are added during a single-threaded registration phase; lookups
/// afterwards only need `&self`.
pub trait PathRouter: Send + Sync + 'static {
    fn add(&mut self, method: Method, path: &str, handler: Arc<dyn Handler>)
    -> Result<(), RouteError>;

    /// Handler and path parameters for a request, if a route matches both
    /// the method and the path.
    fn find(&self, method: &Method, path: &str)
    -> Option<(Arc<dyn Handler>, HashMap<String, String>)>;

    /// Methods registered for routes that match `path` (for 405 responses)
    fn allowed_methods(&self, path: &str) -> Vec<Method>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use http::StatusCode;

    /// Answers with its own name so tests can tell handlers apart.
    pub struct Named(pub &'static str);

    #[async_trait]
    impl Handler for Named {
        async fn handle(&self, req: Request) -> Result<Response, WebError> {
            let mut params: Vec<_> = req.params.iter().collect();
            params.sort();
            Ok(Response::bytes(
                StatusCode::OK,
                format!("{}{:?}", self.0, params),
            ))
        }
    }

    pub fn named(name: &'static str) -> Arc<dyn Handler> {
        Arc::new(Named(name))
    }

    pub async fn body_of(router: &dyn PathRouter, method: Method, path: &str) -> Option<String> {
        let (h, params) = router.find(&method, path)?;
        let req = Request::new(method, path).with_params(params);
        let res = h.handle(req).await.ok()?;
        Some(String::from_utf8_lossy(&res.body).into_owned())
    }
}
