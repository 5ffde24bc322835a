use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Handler, Request, Response};
use crate::error::WebError;

/// Middleware trait for processing requests
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Process the request, optionally calling the next handler
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError>;
}

/// Wrapper that implements Handler for middleware composition
struct MiddlewareHandler {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for MiddlewareHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        self.middleware.handle(req, Arc::clone(&self.next)).await
    }
}

/// Compose multiple middlewares around a final handler.
/// The first middleware in the slice ends up outermost.
pub fn compose(
    middlewares: &[Arc<dyn Middleware>],
    final_handler: Arc<dyn Handler>,
) -> Arc<dyn Handler> {
    middlewares
        .iter()
        .rev()
        .fold(final_handler, |next, middleware| {
            let wrapped: Arc<dyn Handler> = Arc::new(MiddlewareHandler {
                middleware: Arc::clone(middleware),
                next,
            });
            wrapped
        })
}

/// Turn a list of middlewares into a wrapper for
/// `Api::add_resource_with_wrapper`.
pub fn wrap_with(
    middlewares: Vec<Arc<dyn Middleware>>,
) -> impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static {
    move |handler: Arc<dyn Handler>| compose(&middlewares, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Method;
    use http::{HeaderValue, StatusCode};

    // Appends its tag to x-trace on the way out
    struct Trace(&'static str);

    #[async_trait]
    impl Middleware for Trace {
        async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
            let mut res = next.handle(req).await?;
            let current = res
                .headers
                .get("x-trace")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            res.headers.insert(
                "x-trace",
                HeaderValue::from_str(&format!("{}{}", current, self.0)).unwrap(),
            );
            Ok(res)
        }
    }

    struct OkHandler;

    #[async_trait]
    impl Handler for OkHandler {
        async fn handle(&self, _req: Request) -> Result<Response, WebError> {
            Ok(Response::bytes(StatusCode::OK, "H"))
        }
    }

    fn trace_of(res: &Response) -> &str {
        res.headers
            .get("x-trace")
            .and_then(|v| v.to_str().ok())
            .unwrap()
    }

    #[tokio::test]
    async fn compose_puts_first_middleware_outside() {
        let mws: Vec<Arc<dyn Middleware>> = vec![Arc::new(Trace("A>")), Arc::new(Trace("B>"))];
        let h = compose(&mws, Arc::new(OkHandler));
        let res = h.handle(Request::new(Method::GET, "/")).await.unwrap();
        // A wraps B, so A appends last on the way out
        assert_eq!(trace_of(&res), "B>A>");
    }

    #[tokio::test]
    async fn wrap_with_puts_first_middleware_outside() {
        let mws: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(Trace("outer>")), Arc::new(Trace("inner>"))];
        let wrapper = wrap_with(mws);
        let h = wrapper(Arc::new(OkHandler));
        let res = h.handle(Request::new(Method::GET, "/")).await.unwrap();
        assert_eq!(trace_of(&res), "inner>outer>");
    }
}
