//! Routes and their mount specifications

use crate::chain::HandlerChain;
use crate::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Mount configuration of a route
///
/// `name`, `method` and `path` drive routing. Anything else the caller
/// attaches under `meta` is kept verbatim for introspection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSpec {
    pub name: String,
    pub method: String,
    pub path: String,
    #[serde(default, flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl RouteSpec {
    pub fn new(name: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            path: path.into(),
            meta: serde_json::Map::new(),
        }
    }

    /// Attach an opaque metadata entry
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A named binding of (method, path) to a handler chain
///
/// Immutable once mounted. The chain belongs to this route alone.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub spec: RouteSpec,
    pub chain: Arc<HandlerChain>,
}

impl Route {
    pub fn handler_names(&self) -> Vec<String> {
        self.chain.handler_names()
    }

    pub fn debug_info(&self) -> RouteDebugInfo {
        RouteDebugInfo {
            name: self.name.clone(),
            method: self.method.as_str().to_lowercase(),
            path: self.path.clone(),
            handlers: self.handler_names(),
        }
    }
}

/// Introspection record for one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDebugInfo {
    pub name: String,
    /// Lowercased verb
    pub method: String,
    pub path: String,
    /// Handler identifiers in execution order
    pub handlers: Vec<String>,
}
