use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::{Handler, PathRouter, RouteError};
use crate::core::Method;

const DEFAULT_VAR_PATTERN: &str = "[^/]+";

struct Route {
    method: Method,
    pattern: String,
    regex: Regex,
    vars: Vec<String>,
    handler: Arc<dyn Handler>,
}

impl Route {
    fn params(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let params = self
            .vars
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.name(&format!("v{i}"))
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(params)
    }
}

/// Pattern multiplexer. Variables are written `{name}` (one path segment)
/// or `{name:regex}`. Routes are tried in registration order.
pub struct PatternRouter {
    routes: Vec<Route>,
}

impl PatternRouter {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }
}

impl Default for PatternRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRouter for PatternRouter {
    fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == path)
        {
            return Err(RouteError::invalid(
                path,
                format!("{method} is already registered"),
            ));
        }
        let (regex, vars) = compile(path)?;
        self.routes.push(Route {
            method,
            pattern: path.to_string(),
            regex,
            vars,
            handler,
        });
        Ok(())
    }

    fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| r.params(path).map(|p| (Arc::clone(&r.handler), p)))
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in self.routes.iter().filter(|r| r.regex.is_match(path)) {
            if !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }
        methods
    }
}

/// Translate a route pattern into an anchored regex plus its variable names.
fn compile(path: &str) -> Result<(Regex, Vec<String>), RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::invalid(path, "pattern must start with '/'"));
    }

    let mut source = String::from("^");
    let mut vars: Vec<String> = Vec::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        if literal.contains('}') {
            return Err(RouteError::invalid(path, "unbalanced braces"));
        }
        source.push_str(&regex::escape(literal));

        let close =
            closing_brace(tail).ok_or_else(|| RouteError::invalid(path, "unbalanced braces"))?;
        let inner = &tail[1..close];
        let (name, expr) = match inner.split_once(':') {
            Some((name, expr)) => (name.trim(), expr),
            None => (inner.trim(), DEFAULT_VAR_PATTERN),
        };
        if name.is_empty() {
            return Err(RouteError::invalid(path, "missing variable name"));
        }
        if vars.iter().any(|v| v == name) {
            return Err(RouteError::invalid(
                path,
                format!("duplicate variable {name:?}"),
            ));
        }

        source.push_str(&format!("(?P<v{}>{})", vars.len(), expr));
        vars.push(name.to_string());
        rest = &tail[close + 1..];
    }

    if rest.contains('}') {
        return Err(RouteError::invalid(path, "unbalanced braces"));
    }
    source.push_str(&regex::escape(rest));
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| RouteError::invalid(path, e))?;
    Ok((regex, vars))
}

// `s` starts with '{'; nested braces belong to the variable's regex.
fn closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::router::testing::{body_of, named};

    #[tokio::test]
    async fn variables_with_and_without_regex() {
        let mut r = PatternRouter::new();
        r.add(Method::GET, "/items/{id:[0-9]+}", named("by-id")).unwrap();
        r.add(Method::GET, "/items/{slug}", named("by-slug")).unwrap();
        r.add(Method::GET, "/v{major:[0-9]{1,2}}/{name}.json", named("versioned"))
            .unwrap();

        assert_eq!(
            body_of(&r, Method::GET, "/items/42").await.as_deref(),
            Some(r#"by-id[("id", "42")]"#)
        );
        assert_eq!(
            body_of(&r, Method::GET, "/items/shoe").await.as_deref(),
            Some(r#"by-slug[("slug", "shoe")]"#)
        );
        assert_eq!(
            body_of(&r, Method::GET, "/v12/config.json").await.as_deref(),
            Some(r#"versioned[("major", "12"), ("name", "config")]"#)
        );
        assert!(r.find(&Method::GET, "/items/a/b").is_none());
        assert!(r.find(&Method::GET, "/v123/config.json").is_none());
    }

    #[test]
    fn literal_text_is_escaped() {
        let mut r = PatternRouter::new();
        r.add(Method::GET, "/a.b", named("dot")).unwrap();
        assert!(r.find(&Method::GET, "/a.b").is_some());
        assert!(r.find(&Method::GET, "/axb").is_none());
    }

    #[test]
    fn first_registered_route_wins() {
        let mut r = PatternRouter::new();
        r.add(Method::GET, "/items/{id}", named("first")).unwrap();
        r.add(Method::GET, "/items/{id:[0-9]+}", named("second")).unwrap();
        r.add(Method::DELETE, "/items/{id:[0-9]+}", named("delete")).unwrap();

        let (_, params) = r.find(&Method::GET, "/items/1").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("1"));
        assert_eq!(
            r.allowed_methods("/items/1"),
            vec![Method::GET, Method::DELETE]
        );
        assert_eq!(r.allowed_methods("/items/x"), vec![Method::GET]);
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let mut r = PatternRouter::new();
        for bad in [
            "items",
            "/items/{id",
            "/items/id}",
            "/items/{}",
            "/items/{id}/{id}",
            "/items/{id:[0-9}",
        ] {
            assert!(
                matches!(r.add(Method::GET, bad, named("x")), Err(RouteError::InvalidPattern { .. })),
                "{bad} should be rejected"
            );
        }
        r.add(Method::GET, "/items/{id}", named("x")).unwrap();
        assert!(r.add(Method::GET, "/items/{id}", named("y")).is_err());
    }
}
