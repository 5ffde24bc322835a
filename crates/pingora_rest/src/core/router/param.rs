use std::collections::HashMap;
use std::sync::Arc;

use super::{Handler, PathRouter, RouteError};
use crate::core::Method;

/// Parameterized router backed by `matchit`: `/items/{id}`, `/static/{*path}`.
pub struct ParamRouter {
    by_method: HashMap<Method, matchit::Router<Arc<dyn Handler>>>,
}

impl ParamRouter {
    pub fn new() -> Self {
        Self {
            by_method: HashMap::new(),
        }
    }
}

impl Default for ParamRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRouter for ParamRouter {
    fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let r = self.by_method.entry(method).or_default();
        r.insert(path, handler)
            .map_err(|e| RouteError::invalid(path, e))
    }

    fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        let m = self.by_method.get(method)?.at(path).ok()?;
        let params = m
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((Arc::clone(m.value), params))
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.by_method
            .iter()
            .filter(|(_, r)| r.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::router::testing::{body_of, named};

    #[tokio::test]
    async fn matchit_basic_param() {
        let mut r = ParamRouter::new();
        r.add(Method::GET, "/hi/{name}", named("hi")).unwrap();

        let body = body_of(&r, Method::GET, "/hi/alice").await;
        assert_eq!(body.as_deref(), Some(r#"hi[("name", "alice")]"#));
        assert!(r.find(&Method::GET, "/hi").is_none());
    }

    #[tokio::test]
    async fn catch_all_and_static_priority() {
        let mut r = ParamRouter::new();
        r.add(Method::GET, "/files/{*path}", named("files")).unwrap();
        r.add(Method::GET, "/items/{id}", named("item")).unwrap();
        r.add(Method::GET, "/items/new", named("new")).unwrap();

        assert_eq!(
            body_of(&r, Method::GET, "/files/a/b.txt").await.as_deref(),
            Some(r#"files[("path", "a/b.txt")]"#)
        );
        assert_eq!(
            body_of(&r, Method::GET, "/items/new").await.as_deref(),
            Some("new[]")
        );
        assert_eq!(
            body_of(&r, Method::GET, "/items/7").await.as_deref(),
            Some(r#"item[("id", "7")]"#)
        );
    }

    #[test]
    fn conflicting_routes_are_rejected() {
        let mut r = ParamRouter::new();
        r.add(Method::GET, "/items/{id}", named("a")).unwrap();
        let err = r.add(Method::GET, "/items/{id}", named("b")).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
        // Same path under another method is a separate table
        assert!(r.add(Method::PUT, "/items/{id}", named("c")).is_ok());
    }

    #[test]
    fn allowed_methods_lists_matching_tables() {
        let mut r = ParamRouter::new();
        r.add(Method::GET, "/items/{id}", named("get")).unwrap();
        r.add(Method::DELETE, "/items/{id}", named("delete")).unwrap();
        r.add(Method::POST, "/items", named("post")).unwrap();

        let mut allowed = r.allowed_methods("/items/3");
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(allowed, vec![Method::DELETE, Method::GET]);
        assert!(r.allowed_methods("/nothing").is_empty());
    }
}
