use clap::{Parser, ValueEnum};
use pingora_rest::{
    Api, CompressionMiddleware, ExactRouter, Middleware, PanicRecoveryMiddleware, ParamRouter,
    PatternRouter, Reply, RequestContext, Resource, ServerConfig, StderrLogger, TracingLogger,
    TracingMiddleware, wrap_with,
};
use serde::Serialize;
use serde_json::json;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RouterKind {
    /// Literal paths, trailing '/' matches a subtree
    Exact,
    /// Regex-constrained variables, first match wins
    Pattern,
    /// Radix tree with `{name}` and `{*rest}` segments
    Param,
}

#[derive(Debug, Parser)]
#[command(name = "rest_example", about = "Serve a small JSON items API")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Read timeout in seconds
    #[arg(long, default_value_t = 20)]
    http_read_timeout: u64,

    /// Write timeout in seconds
    #[arg(long, default_value_t = 20)]
    http_write_timeout: u64,

    #[arg(long, default_value_t = 1 << 15)]
    max_header_bytes: usize,

    #[arg(long, value_enum, default_value_t = RouterKind::Param)]
    router: RouterKind,

    /// Log request lines to stderr instead of through tracing
    #[arg(long)]
    plain_log: bool,
}

#[derive(Default)]
struct Store {
    items: Mutex<Vec<String>>,
}

#[derive(Serialize)]
struct ItemList {
    items: Vec<String>,
}

impl Store {
    fn list(&self) -> Vec<String> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }

    fn push(&self, name: String) -> usize {
        match self.items.lock() {
            Ok(mut items) => {
                items.push(name);
                items.len() - 1
            }
            Err(_) => 0,
        }
    }

    fn replace(&self, index: usize, name: String) -> bool {
        match self.items.lock() {
            Ok(mut items) => match items.get_mut(index) {
                Some(slot) => {
                    *slot = name;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    fn remove(&self, index: usize) -> Option<String> {
        let mut items = self.items.lock().ok()?;
        (index < items.len()).then(|| items.remove(index))
    }
}

// ExactRouter has no variables; fall back to the last path segment
fn item_index(ctx: &RequestContext) -> Option<usize> {
    ctx.param("id")
        .or_else(|| ctx.path().rsplit('/').next())
        .and_then(|id| id.parse().ok())
}

fn collection(store: &Arc<Store>) -> Resource {
    let list = store.clone();
    let create = store.clone();
    Resource::new()
        .get(move |_: &RequestContext| Reply::new(200, ItemList { items: list.list() }))
        .head(|_: &RequestContext| Reply::new(200, ()))
        .post(move |ctx: &RequestContext| match ctx.form().get("name") {
            Some(name) => {
                let id = create.push(name.to_string());
                Reply::new(201, json!({ "id": id, "name": name }))
                    .header("location", format!("/items/{id}"))
            }
            None => Reply::new(400, json!({ "error": "missing name" })),
        })
}

fn member(store: &Arc<Store>) -> Resource {
    let read = store.clone();
    let update = store.clone();
    let rename = store.clone();
    let delete = store.clone();
    Resource::new()
        .get(move |ctx: &RequestContext| {
            let items = read.list();
            match item_index(ctx).and_then(|i| items.get(i)) {
                Some(name) => Reply::new(200, json!({ "name": name })),
                None => Reply::new(404, json!({ "error": "no such item" })),
            }
        })
        .put(move |ctx: &RequestContext| {
            let name = ctx.form().get("name").unwrap_or_default().to_string();
            match item_index(ctx) {
                Some(i) if update.replace(i, name.clone()) => {
                    Reply::new(200, json!({ "id": i, "name": name }))
                }
                _ => Reply::new(404, json!({ "error": "no such item" })),
            }
        })
        .patch(move |ctx: &RequestContext| {
            let Some(suffix) = ctx.form().get("suffix") else {
                return Reply::new(400, json!({ "error": "missing suffix" }));
            };
            let items = rename.list();
            match item_index(ctx).and_then(|i| items.get(i).map(|name| (i, name))) {
                Some((i, name)) => {
                    let name = format!("{name}{suffix}");
                    rename.replace(i, name.clone());
                    Reply::new(200, json!({ "id": i, "name": name }))
                }
                None => Reply::new(404, json!({ "error": "no such item" })),
            }
        })
        .delete(move |ctx: &RequestContext| {
            match item_index(ctx).and_then(|i| delete.remove(i)) {
                Some(name) => Reply::new(200, json!({ "deleted": name })),
                None => Reply::new(404, json!({ "error": "no such item" })),
            }
        })
}

fn status() -> Resource {
    Resource::new().get(|_: &RequestContext| {
        Reply::new(
            200,
            json!({
                "status": "ok",
                "message": "Server is running",
            }),
        )
    })
}

fn build_api(cli: &Cli) -> Result<Api, Box<dyn std::error::Error>> {
    let config = ServerConfig::new()
        .host(cli.host.clone())
        .read_timeout(Duration::from_secs(cli.http_read_timeout))
        .write_timeout(Duration::from_secs(cli.http_write_timeout))
        .max_header_bytes(cli.max_header_bytes);

    let mut api = Api::with_config(config);
    if cli.plain_log {
        api.set_logger(StderrLogger);
    } else {
        api.set_logger(TracingLogger);
    }

    match cli.router {
        RouterKind::Exact => api.set_router(ExactRouter::new())?,
        RouterKind::Pattern => api.set_router(PatternRouter::new())?,
        RouterKind::Param => api.set_router(ParamRouter::new())?,
    }
    let member_path = match cli.router {
        RouterKind::Exact => "/items/",
        RouterKind::Pattern => "/items/{id:[0-9]+}",
        RouterKind::Param => "/items/{id}",
    };

    // Tracing outermost so panics recovered below still get a span
    let middlewares: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(TracingMiddleware::new()),
        Arc::new(PanicRecoveryMiddleware::new()),
        Arc::new(CompressionMiddleware::new()),
    ];
    let wrapper = wrap_with(middlewares);

    let store = Arc::new(Store::default());
    api.add_resource_with_wrapper(&collection(&store), &wrapper, &["/items"])?;
    api.add_resource_with_wrapper(&member(&store), &wrapper, &[member_path])?;
    api.add_resource(&status(), &["/api/status", "/healthz"])?;
    Ok(api)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Default INFO, override with RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let api = match build_api(&cli) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("setup error: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(host = %cli.host, port = cli.port, router = ?cli.router, "starting rest_example");
    match api.start(cli.port) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_router_accepts_the_demo_routes() {
        for router in ["exact", "pattern", "param"] {
            let cli = Cli::try_parse_from(["rest_example", "--router", router]).unwrap();
            assert!(build_api(&cli).is_ok(), "{router}");
        }
    }

    #[test]
    fn unknown_router_is_rejected_by_the_cli() {
        assert!(Cli::try_parse_from(["rest_example", "--router", "trie"]).is_err());
    }

    #[test]
    fn start_failure_is_reported() {
        // Not a resolvable host, so binding fails before pingora starts
        let cli = Cli::try_parse_from(["rest_example", "--host", "256.0.0.1", "--port", "1"])
            .unwrap();
        let err = build_api(&cli).unwrap().start(cli.port).unwrap_err();
        assert!(matches!(err, pingora_rest::ServeError::Bind { .. }));
    }
}
