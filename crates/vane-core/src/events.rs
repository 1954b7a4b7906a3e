//! Router lifecycle notifications
//!
//! Observers are registered on the router and called synchronously, in
//! subscription order, on the thread performing the operation.

use crate::route::Route;
use crate::{Method, Request, Response};

/// Receives router lifecycle events. Every method defaults to a no-op.
pub trait RouterObserver: Send + Sync {
    /// A route was mounted for `method` and `path`
    ///
    /// Called while the router's writer lock is held, in the order the
    /// table generations are published. Mounting or unmounting from here
    /// deadlocks.
    fn on_mount(&self, _method: Method, _path: &str) {}

    /// A request matched `route`; fires before its chain runs
    fn on_routed(&self, _req: &Request, _res: &Response, _route: &Route) {}
}
