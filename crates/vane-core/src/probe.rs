//! Route probes
//!
//! Start/done hooks fired around the matcher query of a lookup, only for
//! requests that opted in via [`Request::trace`]. Both events of one lookup
//! share a correlation id taken from `x-request-id` or generated.

use crate::{Method, Request, StatusCode};

/// Header carrying a caller-supplied correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fired before the matcher is queried
#[derive(Debug, Clone)]
pub struct RouteStart<'a> {
    pub server: &'a str,
    pub id: &'a str,
    pub method: Method,
    pub url: String,
    pub headers: &'a [(String, String)],
}

/// Fired once the matcher answered
#[derive(Debug, Clone)]
pub struct RouteDone<'a> {
    pub server: &'a str,
    pub id: &'a str,
    /// Matched route, `None` when the fallback policy takes over
    pub route: Option<&'a str>,
    pub status: StatusCode,
    pub headers: &'a [(String, String)],
}

/// Probe sink
pub trait Probe: Send + Sync {
    fn route_start(&self, event: &RouteStart<'_>);
    fn route_done(&self, event: &RouteDone<'_>);
}

/// Correlation id of `req`, assigning one on first use
pub fn correlation_id(req: &mut Request) -> String {
    if let Some(id) = &req.id {
        return id.clone();
    }
    let id = req
        .header(REQUEST_ID_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    req.id = Some(id.clone());
    id
}
