use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};

#[derive(Debug)]
pub struct Request {
    pub inner: http::Request<Bytes>,
    pub params: HashMap<String, String>,
    pub remote_addr: Option<String>,
}

impl Request {
    /// Build a request for in-process use. An unparsable target falls back to `/`.
    pub fn new<M: Into<Method>, S: AsRef<str>>(method: M, target: S) -> Self {
        let uri = Uri::try_from(target.as_ref()).unwrap_or_else(|_| Uri::from_static("/"));
        Self::from_parts(method.into(), uri, HeaderMap::new(), Bytes::new())
    }

    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut inner = http::Request::new(body);
        *inner.method_mut() = method;
        *inner.uri_mut() = uri;
        *inner.headers_mut() = headers;
        Self {
            inner,
            params: HashMap::new(),
            remote_addr: None,
        }
    }

    /// Append a header, keeping any earlier values under the same name.
    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.inner.headers_mut().append(key, value);
        }
        self
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        *self.inner.body_mut() = body.into();
        self
    }

    pub fn with_remote_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    /// Raw query string without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.inner.uri().query()
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        self.inner.headers_mut()
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}
