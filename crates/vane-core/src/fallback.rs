//! Fallback policy for unmatched requests
//!
//! Decides between a CORS preflight success, 405 Method Not Allowed and
//! 404 Not Found. The decision probes the matcher once per method in
//! [`Method::ALL`] rather than keeping a per-path method index, so it is
//! always consistent with the snapshot it runs against.

use crate::Method;
use vane_router::PathMatcher;

/// Outcome of the fallback policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// `OPTIONS *`: answer 200, no error
    Preflight,
    /// The path exists under these methods, in canonical order
    MethodNotAllowed(Vec<Method>),
    /// The path exists under no method
    NotFound,
}

/// Resolve an unmatched `(method, path)` against `matcher`
pub fn resolve<T>(matcher: &PathMatcher<T>, method: Method, path: &str) -> Fallback {
    if method == Method::Options && path == "*" {
        return Fallback::Preflight;
    }

    let allowed = allowed_methods(matcher, path);
    if allowed.is_empty() {
        Fallback::NotFound
    } else {
        Fallback::MethodNotAllowed(allowed)
    }
}

/// Every method under which `path` matches, in canonical order
pub fn allowed_methods<T>(matcher: &PathMatcher<T>, path: &str) -> Vec<Method> {
    Method::ALL
        .iter()
        .copied()
        .filter(|m| matcher.find(m.as_str(), path).is_some())
        .collect()
}

/// Value of the `Allow` header for `methods`
pub fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
