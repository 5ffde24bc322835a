pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod middleware;

// Re-export commonly used types at the crate root
pub use config::ServerConfig;
pub use self::core::*;
pub use error::{ConfigError, DispatchError, ResponseError, ServeError, WebError};
pub use http::StatusCode;
pub use logging::*;
pub use middleware::*;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderValue, Response as HttpResponse};
use std::sync::Arc;

use pingora::protocols::http::ServerSession;
use pingora::server::{Server, ShutdownWatch};
use pingora::services::listening::Service;
use pingora_core::apps::{
    HttpPersistentSettings, HttpServerApp, HttpServerOptions, ReusedHttpStream,
};
use pingora_http::ResponseHeader;

/// Routes requests to the verb-matching entry point of a registered
/// [`Resource`] and writes the returned value as indented JSON.
///
/// Registration happens through `&mut self` before serving starts;
/// [`Api::start`] consumes the API, so the route table is read-only while
/// requests are served.
pub struct Api {
    router: Option<Box<dyn PathRouter>>,
    logger: Option<Arc<dyn Logger>>,
    config: ServerConfig,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            router: None,
            logger: None,
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Log every request through `logger`. Without one, nothing is logged.
    pub fn set_logger<L: Logger + 'static>(&mut self, logger: L) {
        self.logger = Some(Arc::new(logger));
    }

    pub fn with_logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.set_logger(logger);
        self
    }

    /// The router in use, creating the default [`ParamRouter`] on first use.
    pub fn router(&mut self) -> &mut dyn PathRouter {
        self.router.get_or_insert_with(default_router).as_mut()
    }

    /// Bind a specific router. Fails once any router is bound, including
    /// the default one created by registering a resource.
    pub fn set_router<R: PathRouter>(&mut self, router: R) -> Result<(), ConfigError> {
        if self.router.is_some() {
            return Err(ConfigError::RouterAlreadyBound);
        }
        self.router = Some(Box::new(router));
        Ok(())
    }

    /// Route requests matching any of `paths` to the verb-matching entry
    /// point of `resource`. One route is registered per (path, verb) pair.
    pub fn add_resource(&mut self, resource: &Resource, paths: &[&str]) -> Result<(), RouteError> {
        self.register(resource, paths, |handler| handler)
    }

    /// Like [`Api::add_resource`], but each per-verb handler is passed
    /// through `wrapper` once, at registration time.
    pub fn add_resource_with_wrapper<W>(
        &mut self,
        resource: &Resource,
        wrapper: W,
        paths: &[&str],
    ) -> Result<(), RouteError>
    where
        W: Fn(Arc<dyn Handler>) -> Arc<dyn Handler>,
    {
        self.register(resource, paths, wrapper)
    }

    fn register<W>(&mut self, resource: &Resource, paths: &[&str], wrapper: W) -> Result<(), RouteError>
    where
        W: Fn(Arc<dyn Handler>) -> Arc<dyn Handler>,
    {
        let verbs = resource.verbs();
        if verbs.is_empty() {
            return Err(RouteError::NoEntryPoints);
        }
        if paths.is_empty() {
            return Err(RouteError::NoPaths);
        }

        let router = self.router();
        for path in paths {
            for &verb in &verbs {
                let Some(entry) = resource.entry_point(verb) else {
                    continue;
                };
                let dispatcher: Arc<dyn Handler> = Arc::new(Dispatcher::new(verb, entry));
                router.add(verb.method(), path, wrapper(dispatcher))?;
            }
        }
        Ok(())
    }

    /// Handle a request end-to-end: route, dispatch, log.
    pub async fn handle(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.path().to_string();
        let query = req.query().map(str::to_string);
        let remote_addr = req.remote_addr().map(str::to_string);

        let (mut response, outcome) = self.route(req).await;

        self.log_request(&RequestLine {
            remote_addr: remote_addr.as_deref(),
            method: &method,
            path: &path,
            query: query.as_deref(),
            status: response.status.as_u16(),
            outcome: &outcome,
        });

        self.finalize_response_headers(&mut response);
        response
    }

    async fn route(&self, req: Request) -> (Response, String) {
        let found = self
            .router
            .as_ref()
            .and_then(|r| r.find(req.method(), req.path()));
        let Some((handler, params)) = found else {
            return self.unrouted(&req);
        };

        match handler.handle(req.with_params(params)).await {
            Ok(res) => (res, "OK".to_string()),
            Err(err) => {
                let outcome = err.to_string();
                (err.into_response(), outcome)
            }
        }
    }

    // No route for this method: 405 if the path is known under other verbs, else 404.
    fn unrouted(&self, req: &Request) -> (Response, String) {
        let mut allowed = self
            .router
            .as_ref()
            .map(|r| r.allowed_methods(req.path()))
            .unwrap_or_default();
        if allowed.is_empty() {
            return (
                Response::empty(StatusCode::NOT_FOUND),
                "no route matches the path".to_string(),
            );
        }

        allowed.sort_by_key(|m| Verb::from_method(m).map_or(usize::MAX, |v| v as usize));
        allowed.dedup();
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let err = DispatchError::UnsupportedMethod {
            method: req.method().to_string(),
        };
        let mut res = err.error_response();
        if let Ok(value) = HeaderValue::from_str(&allow) {
            res.headers.insert(http::header::ALLOW, value);
        }
        (res, err.to_string())
    }

    /// Set content-length from the body unless a handler already did
    fn finalize_response_headers(&self, response: &mut Response) {
        if response.headers.contains_key(http::header::CONTENT_LENGTH)
            || response
                .headers
                .contains_key(http::header::TRANSFER_ENCODING)
        {
            return;
        }
        response
            .headers
            .insert(http::header::CONTENT_LENGTH, HeaderValue::from(response.body.len()));
    }

    fn log(&self, level: Level, message: &str) {
        if let Some(logger) = &self.logger {
            logger.log(level, message);
        }
    }

    fn log_request(&self, line: &RequestLine<'_>) {
        if self.logger.is_some() {
            self.log(Level::for_status(line.status), &line.to_string());
        }
    }

    /// Serve on `port` of the configured host.
    ///
    /// Fails without touching the network when no resource has been added,
    /// with [`ServeError::Bind`] when the address cannot be bound and with
    /// [`ServeError::Server`] when pingora cannot be set up. Once serving,
    /// this never returns: pingora's `run_forever` handles transport errors
    /// itself (logging them and dropping the connection) and exits the
    /// process on shutdown, so later failures never reach the caller.
    pub fn start(self, port: u16) -> Result<(), ServeError> {
        let addr = self.config.listen_addr(port);
        let service = self.into_service(&addr)?;

        let mut server = Server::new(None).map_err(|e| ServeError::Server(e.to_string()))?;
        server.bootstrap();
        server.add_service(service);
        server.run_forever()
    }

    /// Wrap the API in a pingora listening service bound to `addr`, for
    /// embedding in an existing pingora `Server`.
    pub fn into_service(self, addr: &str) -> Result<Service<Api>, ServeError> {
        if self.router.is_none() {
            let err = ConfigError::NoResources;
            self.log(Level::Error, &err.to_string());
            return Err(err.into());
        }

        // pingora only logs bind failures; check the address so the caller sees them
        drop(
            std::net::TcpListener::bind(addr).map_err(|source| ServeError::Bind {
                addr: addr.to_string(),
                source,
            })?,
        );

        self.log(Level::Info, &format!("listening on http://{addr}"));
        let mut service = Service::new("pingora_rest".to_string(), self);
        service.add_tcp(addr);
        Ok(service)
    }

    /// Run one request read off a connection through the API and write the
    /// answer. Returns `false` when the connection must not be reused.
    async fn exchange<E: Exchange>(&self, io: &mut E, mut req: Request) -> bool {
        let is_head = req.method() == http::Method::HEAD;

        if header_block_len(&req) > self.config.max_header_bytes {
            return self
                .reject(
                    io,
                    &req,
                    StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
                    "request headers too large",
                )
                .await;
        }

        if !is_head && expects_body(&req) {
            match read_body(io, self.config.max_body_bytes).await {
                BodyRead::Complete(body) => req = req.with_body(body),
                BodyRead::TooLarge => {
                    return self
                        .reject(io, &req, StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
                        .await;
                }
                BodyRead::Failed => {
                    return self
                        .reject(io, &req, StatusCode::BAD_REQUEST, "failed to read request body")
                        .await;
                }
            }
        }

        let res = self.handle(req).await;

        // HEAD responses carry headers only
        io.send_response(res, !is_head).await
    }

    async fn reject<E: Exchange>(
        &self,
        io: &mut E,
        req: &Request,
        status: StatusCode,
        outcome: &str,
    ) -> bool {
        self.log_request(&RequestLine {
            remote_addr: req.remote_addr(),
            method: req.method(),
            path: req.path(),
            query: req.query(),
            status: status.as_u16(),
            outcome,
        });
        let mut res = Response::empty(status);
        self.finalize_response_headers(&mut res);
        io.disable_keepalive();
        let _ = io.send_response(res, false).await;
        false
    }
}

fn default_router() -> Box<dyn PathRouter> {
    Box::new(ParamRouter::new())
}

// Request line plus header fields, as counted against `max_header_bytes`.
fn header_block_len(req: &Request) -> usize {
    let target = req.uri().path_and_query().map_or(1, |pq| pq.as_str().len());
    let fields: usize = req
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum();
    req.method().as_str().len() + target + 12 + fields
}

// Body is read only when hinted by headers (content-length > 0 or transfer-encoding present)
fn expects_body(req: &Request) -> bool {
    let has_te = req.headers().contains_key(http::header::TRANSFER_ENCODING);
    let has_len = req
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
        > 0;
    has_te || has_len
}

/// The connection side of one request/response exchange.
#[async_trait]
trait Exchange: Send {
    async fn next_body_chunk(&mut self) -> pingora_core::Result<Option<Bytes>>;

    /// Write the response head and, if `send_body`, its body. `false` on
    /// any write failure.
    async fn send_response(&mut self, res: Response, send_body: bool) -> bool;

    fn disable_keepalive(&mut self);
}

#[async_trait]
impl Exchange for ServerSession {
    async fn next_body_chunk(&mut self) -> pingora_core::Result<Option<Bytes>> {
        self.read_request_body().await
    }

    async fn send_response(&mut self, res: Response, send_body: bool) -> bool {
        let mut builder = HttpResponse::builder().status(res.status);
        for (k, v) in res.headers.iter() {
            builder = builder.header(k, v);
        }
        let Ok(head) = builder.body(()) else {
            return false;
        };
        let (parts, _) = head.into_parts();
        let resp_header: ResponseHeader = parts.into();
        if self
            .write_response_header(Box::new(resp_header))
            .await
            .is_err()
        {
            return false;
        }
        !send_body || self.write_response_body(res.body, true).await.is_ok()
    }

    fn disable_keepalive(&mut self) {
        self.set_keepalive(None);
    }
}

enum BodyRead {
    Complete(Bytes),
    TooLarge,
    Failed,
}

async fn read_body<E: Exchange>(io: &mut E, limit: usize) -> BodyRead {
    let mut body = BytesMut::new();
    loop {
        match io.next_body_chunk().await {
            Ok(Some(chunk)) => {
                if body.len() + chunk.len() > limit {
                    return BodyRead::TooLarge;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => return BodyRead::Complete(body.freeze()),
            Err(e) => {
                tracing::debug!(error = %e, "request body read failed");
                return BodyRead::Failed;
            }
        }
    }
}

#[async_trait]
impl HttpServerApp for Api {
    async fn process_new_http(
        self: &Arc<Self>,
        mut http: ServerSession,
        shutdown: &ShutdownWatch,
    ) -> Option<ReusedHttpStream> {
        http.set_read_timeout(Some(self.config.read_timeout));
        http.set_write_timeout(Some(self.config.write_timeout));

        if !(http.read_request().await.ok()?) {
            return None;
        }
        if *shutdown.borrow() {
            http.set_keepalive(None);
        } else {
            http.set_keepalive(self.config.keepalive.map(|d| d.as_secs()));
        }

        let reqh = http.req_header();
        let mut req = Request::from_parts(
            reqh.method.clone(),
            reqh.uri.clone(),
            reqh.headers.clone(),
            Bytes::new(),
        );
        if let Some(addr) = http.client_addr() {
            req = req.with_remote_addr(addr.to_string());
        }

        if !self.exchange(&mut http, req).await {
            let _ = http.finish().await;
            return None;
        }

        let persistent_settings = HttpPersistentSettings::for_session(&http);
        match http.finish().await {
            Ok(c) => c.map(|s| ReusedHttpStream::new(s, Some(persistent_settings))),
            Err(_) => None,
        }
    }

    fn h2_options(&self) -> Option<pingora::protocols::http::v2::server::H2Options> {
        None
    }

    fn server_options(&self) -> Option<&HttpServerOptions> {
        None
    }
}
