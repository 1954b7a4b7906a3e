//! Route registry: route name -> route

use crate::route::Route;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-indexed routes
///
/// Holds at most one route per name. Cloning is shallow (routes are
/// shared), which is what the router relies on to build replacement
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route under its name, returning the route it replaced
    pub fn insert(&mut self, route: Arc<Route>) -> Option<Arc<Route>> {
        self.routes.insert(route.name.clone(), route)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Route>> {
        self.routes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<Route>)> {
        self.routes.iter()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn as_map(&self) -> &HashMap<String, Arc<Route>> {
        &self.routes
    }
}
