use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::{Handler, PathRouter, RouteError};
use crate::core::Method;

/// Basic multiplexer. A pattern matches its path exactly, except that a
/// pattern ending in `/` also matches every path below it. The longest
/// matching pattern wins and decides the allowed methods.
pub struct ExactRouter {
    by_pattern: HashMap<String, HashMap<Method, Arc<dyn Handler>>>,
}

impl ExactRouter {
    pub fn new() -> Self {
        Self {
            by_pattern: HashMap::new(),
        }
    }

    fn best_match(&self, path: &str) -> Option<&HashMap<Method, Arc<dyn Handler>>> {
        if let Some(methods) = self.by_pattern.get(path) {
            return Some(methods);
        }
        self.by_pattern
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, methods)| methods)
    }
}

impl Default for ExactRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRouter for ExactRouter {
    fn add(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::invalid(path, "pattern must start with '/'"));
        }
        let methods = self.by_pattern.entry(path.to_string()).or_default();
        match methods.entry(method) {
            Entry::Occupied(e) => Err(RouteError::invalid(
                path,
                format!("{} is already registered", e.key()),
            )),
            Entry::Vacant(e) => {
                e.insert(handler);
                Ok(())
            }
        }
    }

    fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        let handler = self.best_match(path)?.get(method)?;
        Some((Arc::clone(handler), HashMap::new()))
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.best_match(path)
            .map(|methods| methods.keys().cloned().collect())
            .unwrap_or_default()
    }
}
