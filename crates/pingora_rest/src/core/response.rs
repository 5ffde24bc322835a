use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Construct an empty response with given status. Does not set content-type.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// Construct a raw bytes response. Does not set content-type.
    pub fn bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut res = Self::new(status);
        res.body = body.into();
        res
    }


    pub fn set_header<K, V>(&mut self, k: K, v: V)
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.headers.insert(key, value);
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        self.set_header(k, v);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_sets_no_headers() {
        let res = Response::bytes(StatusCode::CREATED, b"{}".to_vec());
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(&res.body[..], b"{}");
        assert!(!res.headers.contains_key(http::header::CONTENT_TYPE));
        // content-length is set by Api::handle, not here
        assert!(!res.headers.contains_key(http::header::CONTENT_LENGTH));
    }

    #[test]
    fn empty_has_no_body_or_content_type() {
        let res = Response::empty(StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.body.is_empty());
        assert!(!res.headers.contains_key(http::header::CONTENT_TYPE));
    }

    #[test]
    fn manual_headers_not_overridden() {
        let mut res = Response::bytes(StatusCode::OK, "hello");
        res.set_header("content-length", "999");
        assert_eq!(
            res.headers.get(http::header::CONTENT_LENGTH).unwrap(),
            &HeaderValue::from_static("999")
        );
    }
}
