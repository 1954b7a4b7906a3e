//! vane-core: request-dispatch core
//!
//! Maps a method and path to a named route's handler chain and runs it.
//! When nothing matches, a fallback policy answers instead:
//!
//! - `OPTIONS *` succeeds (CORS preflight)
//! - a path known under other methods fails with `MethodNotAllowed` and an
//!   `Allow` header
//! - anything else fails with `ResourceNotFound`
//!
//! Every outcome reaches the caller through the dispatch continuation.
//!
//! ```
//! use vane_core::{Handler, Method, Request, Response, RouteSpec, Router};
//!
//! let router = Router::default();
//! router
//!     .mount(
//!         RouteSpec::new("getUser", "GET", "/users/:id"),
//!         vec![Handler::new(|req, mut res, next| {
//!             res.body = format!("user {}", req.param("id").unwrap_or("?")).into();
//!             next.proceed(req, res);
//!         })],
//!     )
//!     .unwrap();
//!
//! router.lookup(Request::new(Method::Get, "/users/7"), Response::ok(), |err, _req, res| {
//!     assert!(err.is_none());
//!     assert_eq!(res.body_string().as_deref(), Some("user 7"));
//! });
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod probe;
pub mod registry;
pub mod request;
pub mod response;
pub mod route;
pub mod router;

// Re-exports
pub use chain::{Continuation, Handler, HandlerChain, Next};
pub use config::RouterConfig;
pub use error::{ConfigError, DispatchError, Error, HandlerError, Result};
pub use events::RouterObserver;
pub use fallback::Fallback;
pub use probe::{Probe, RouteDone, RouteStart};
pub use registry::RouteRegistry;
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, StatusCode};
pub use route::{Route, RouteDebugInfo, RouteSpec};
pub use router::{Router, Routes};
