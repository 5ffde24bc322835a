use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

use crate::core::Response;
use crate::error::DispatchError;

// Type-erased body so a Reply can carry any serializable value.
trait JsonBody: Send {
    fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send> JsonBody for T {
    fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// What an entry point returns: a status code, a serializable body and
/// extra response headers.
pub struct Reply {
    status: u16,
    body: Box<dyn JsonBody>,
    headers: HeaderMap,
}

impl Reply {
    pub fn new<T: Serialize + Send + 'static>(status: u16, body: T) -> Self {
        Self {
            status,
            body: Box::new(body),
            headers: HeaderMap::new(),
        }
    }

    /// Append a header value. Earlier values under the same name are kept.
    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Debug,
        V::Error: std::fmt::Debug,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.headers.append(key, value);
        }
        self
    }

    /// Append every value of `headers`, in iteration order.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut current = None;
        for (name, value) in headers {
            if let Some(name) = name {
                current = Some(name);
            }
            if let Some(name) = &current {
                self.headers.append(name.clone(), value);
            }
        }
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encode the body as indented JSON and assemble the final response.
    pub fn into_response(self) -> Result<Response, DispatchError> {
        let status =
            StatusCode::from_u16(self.status).map_err(|_| DispatchError::InvalidStatus(self.status))?;
        let body = self.body.to_pretty_json()?;

        let mut res = Response::bytes(status, body);
        res.headers = self.headers;
        if !res.headers.contains_key(http::header::CONTENT_TYPE) {
            res.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        Ok(res)
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn encodes_with_two_space_indent() {
        let items = HashMap::from([("items", vec!["item1", "item2"])]);
        let res = Reply::new(200, items).into_response().unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(
            std::str::from_utf8(&res.body).unwrap(),
            "{\n  \"items\": [\n    \"item1\",\n    \"item2\"\n  ]\n}"
        );
        assert_eq!(
            res.headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn repeated_headers_kept_in_order() {
        let mut extra = HeaderMap::new();
        extra.append("x-b", HeaderValue::from_static("3"));
        extra.append("x-b", HeaderValue::from_static("4"));
        let res = Reply::new(201, json!(null))
            .header("x-a", "1")
            .header("x-a", "2")
            .headers(extra)
            .into_response()
            .unwrap();
        let a: Vec<_> = res.headers.get_all("x-a").iter().collect();
        let b: Vec<_> = res.headers.get_all("x-b").iter().collect();
        assert_eq!(a, vec!["1", "2"]);
        assert_eq!(b, vec!["3", "4"]);
        assert_eq!(std::str::from_utf8(&res.body).unwrap(), "null");
    }

    #[test]
    fn handler_content_type_is_kept() {
        let res = Reply::new(200, "x")
            .header("content-type", "application/vnd.api+json")
            .into_response()
            .unwrap();
        let types: Vec<_> = res.headers.get_all(http::header::CONTENT_TYPE).iter().collect();
        assert_eq!(types, vec!["application/vnd.api+json"]);
    }

    #[test]
    fn unencodable_body_fails() {
        // JSON object keys must be strings
        let body = HashMap::from([(vec![1u8], 1)]);
        let err = Reply::new(200, body).into_response().unwrap_err();
        assert!(matches!(err, DispatchError::Encoding(_)));
    }

    #[test]
    fn out_of_range_status_fails() {
        let err = Reply::new(42, ()).into_response().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidStatus(42)));
    }
}
