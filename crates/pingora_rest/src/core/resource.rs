use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::core::{Form, Reply, Request};

/// The closed set of HTTP verbs a resource may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Head,
        Verb::Patch,
    ];

    /// Any method outside the closed set maps to `None`.
    pub fn from_method(method: &Method) -> Option<Verb> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::DELETE => Some(Verb::Delete),
            Method::HEAD => Some(Verb::Head),
            Method::PATCH => Some(Verb::Patch),
            _ => None,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
            Verb::Head => Method::HEAD,
            Verb::Patch => Method::PATCH,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// Everything an entry point gets to see about one request.
#[derive(Debug)]
pub struct RequestContext {
    form: Form,
    request: Request,
}

impl RequestContext {
    pub fn new(request: Request, form: Form) -> Self {
        Self { form, request }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Parameters extracted from the path by the router.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.request.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// A verb-specific callable. Implemented for plain closures too.
pub trait EntryPoint: Send + Sync + 'static {
    fn call(&self, ctx: &RequestContext) -> Reply;
}

impl<F> EntryPoint for F
where
    F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
{
    fn call(&self, ctx: &RequestContext) -> Reply {
        self(ctx)
    }
}

/// A handler: one optional entry point per verb. No verb is mandatory.
///
/// ```ignore
/// let items = Resource::new()
///     .get(|_ctx: &RequestContext| Reply::new(200, vec!["item1", "item2"]))
///     .post(|ctx: &RequestContext| Reply::new(201, ctx.form().get("name")));
/// ```
#[derive(Clone, Default)]
pub struct Resource {
    slots: [Option<Arc<dyn EntryPoint>>; 6],
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<E: EntryPoint>(mut self, verb: Verb, entry: E) -> Self {
        self.slots[verb.slot()] = Some(Arc::new(entry));
        self
    }

    /// Install an entry point that is already shared with other resources.
    pub fn on_shared(mut self, verb: Verb, entry: Arc<dyn EntryPoint>) -> Self {
        self.slots[verb.slot()] = Some(entry);
        self
    }

    pub fn get<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Get, entry)
    }

    pub fn post<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Post, entry)
    }

    pub fn put<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Put, entry)
    }

    pub fn delete<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Delete, entry)
    }

    pub fn head<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Head, entry)
    }

    pub fn patch<E: EntryPoint>(self, entry: E) -> Self {
        self.on(Verb::Patch, entry)
    }

    pub fn entry_point(&self, verb: Verb) -> Option<Arc<dyn EntryPoint>> {
        self.slots[verb.slot()].clone()
    }

    pub fn resolve(&self, method: &Method) -> Option<Arc<dyn EntryPoint>> {
        Verb::from_method(method).and_then(|verb| self.entry_point(verb))
    }

    pub fn supports(&self, verb: Verb) -> bool {
        self.slots[verb.slot()].is_some()
    }

    pub fn verbs(&self) -> Vec<Verb> {
        Verb::ALL
            .into_iter()
            .filter(|verb| self.supports(*verb))
            .collect()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("verbs", &self.verbs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl EntryPoint for Counter {
        fn call(&self, ctx: &RequestContext) -> Reply {
            Reply::new(200, ctx.form().len())
        }
    }

    fn ctx(method: Method, target: &str) -> RequestContext {
        let req = Request::new(method, target);
        let form = Form::parse(&req).unwrap();
        RequestContext::new(req, form)
    }

    #[test]
    fn resolves_only_supported_verbs() {
        let resource = Resource::new()
            .get(|_: &RequestContext| Reply::new(200, "get"))
            .delete(Counter);

        assert_eq!(resource.verbs(), vec![Verb::Get, Verb::Delete]);
        assert!(resource.resolve(&Method::GET).is_some());
        assert!(resource.resolve(&Method::DELETE).is_some());
        assert!(resource.resolve(&Method::POST).is_none());
        assert!(resource.resolve(&Method::OPTIONS).is_none());
        assert!(resource.resolve(&Method::from_bytes(b"PURGE").unwrap()).is_none());
    }

    #[test]
    fn empty_resource_supports_nothing() {
        let resource = Resource::new();
        assert!(resource.verbs().is_empty());
        for verb in Verb::ALL {
            assert!(resource.entry_point(verb).is_none());
        }
    }

    #[test]
    fn struct_entry_point_sees_form() {
        let resource = Resource::new().patch(Counter);
        let entry = resource.entry_point(Verb::Patch).unwrap();
        let reply = entry.call(&ctx(Method::PATCH, "/x?a=1&b=2"));
        assert_eq!(reply.status(), 200);
    }

    #[test]
    fn verb_round_trips_through_method() {
        for verb in Verb::ALL {
            assert_eq!(Verb::from_method(&verb.method()), Some(verb));
        }
        assert_eq!(Verb::Patch.to_string(), "PATCH");
    }
}
