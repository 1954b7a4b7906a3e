//! Router: named routes over a path matcher
//!
//! The route registry and the matcher live together in one immutable
//! [`RouteTable`] snapshot behind an `ArcSwap`. Lookups load a snapshot
//! and never block. Mount and unmount are serialised by a writer lock,
//! build the next table from the current one and publish it with a
//! single store, so no reader can see the registry and the matcher
//! disagree.

use crate::chain::{Continuation, Handler, HandlerChain};
use crate::config::RouterConfig;
use crate::events::RouterObserver;
use crate::fallback::{self, Fallback};
use crate::probe::{self, Probe, RouteDone, RouteStart};
use crate::registry::RouteRegistry;
use crate::route::{Route, RouteDebugInfo, RouteSpec};
use crate::{DispatchError, Error, Method, Request, Response, Result, StatusCode};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vane_router::PathMatcher;

/// Matcher metadata attached to every binding
#[derive(Debug, Clone)]
struct BindingMeta {
    route: Arc<Route>,
}

/// Value bound in the matcher: the chain to run plus its metadata
#[derive(Debug, Clone)]
struct Binding {
    chain: Arc<HandlerChain>,
    meta: BindingMeta,
}

/// One consistent generation of the route table
#[derive(Debug, Clone, Default)]
struct RouteTable {
    matcher: PathMatcher<Binding>,
    registry: RouteRegistry,
}

impl RouteTable {
    /// Every registered name has its binding and every binding is registered
    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.matcher.len() == self.registry.len()
            && self.registry.iter().all(|(name, route)| {
                self.matcher
                    .get(route.method.as_str(), &route.path)
                    .is_some_and(|b| &b.meta.route.name == name)
            })
    }
}

/// Read-only view of the registered routes at the time it was taken
pub struct Routes {
    table: Arc<RouteTable>,
}

impl Deref for Routes {
    type Target = HashMap<String, Arc<Route>>;

    fn deref(&self) -> &Self::Target {
        self.table.registry.as_map()
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.table.registry.names()).finish()
    }
}

/// Request dispatch core
///
/// Maps `(method, path)` to a route's handler chain, and resolves misses
/// to a CORS preflight success, 405 or 404 through the continuation.
pub struct Router {
    config: RouterConfig,
    table: ArcSwap<RouteTable>,
    /// Serialises mount/unmount
    write_lock: Mutex<()>,
    /// Next suffix for anonymous handler names
    anonymous_handlers: AtomicU64,
    observers: ArcSwap<Vec<Arc<dyn RouterObserver>>>,
    probe: RwLock<Option<Arc<dyn Probe>>>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            table: ArcSwap::from_pointee(RouteTable::default()),
            write_lock: Mutex::new(()),
            anonymous_handlers: AtomicU64::new(0),
            observers: ArcSwap::from_pointee(Vec::new()),
            probe: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Mount a route
    ///
    /// Handlers run in the given order. Anonymous handlers get a generated
    /// name (`handler-<n>`) for introspection. Mounting a name that is
    /// already registered replaces that route and its binding, unless the
    /// router rejects duplicate names.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the name, method or path is missing,
    /// the method is unknown, no handlers are given, or the method and path
    /// are already bound by a route with another name. The table is left
    /// unchanged.
    pub fn mount(&self, spec: RouteSpec, handlers: Vec<Handler>) -> Result<Arc<Route>> {
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidArgument("route name is required".to_string()));
        }
        if spec.method.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "route `{}` has no method",
                spec.name
            )));
        }
        if spec.path.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "route `{}` has no path",
                spec.name
            )));
        }
        if handlers.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "route `{}` needs at least one handler",
                spec.name
            )));
        }
        let method = Method::from_str(spec.method.trim())?;

        let mut chain = HandlerChain::new(self.config.enforce_single_continuation_call);
        for handler in handlers {
            let handler = match handler.name() {
                Some(_) => handler,
                None => {
                    let n = self.anonymous_handlers.fetch_add(1, Ordering::Relaxed);
                    handler.with_name(format!("{}-{n}", self.config.anonymous_handler_prefix))
                }
            };
            chain.append(handler);
        }

        let chain = Arc::new(chain);
        let route = Arc::new(Route {
            name: spec.name.clone(),
            method,
            path: spec.path.clone(),
            spec,
            chain: Arc::clone(&chain),
        });

        {
            let _writer = self.write_lock.lock();
            let current = self.table.load_full();

            if self.config.reject_duplicate_names && current.registry.contains(&route.name) {
                warn!(route = %route.name, "Rejected mount of duplicate route name");
                return Err(Error::InvalidArgument(format!(
                    "route `{}` is already mounted",
                    route.name
                )));
            }
            if let Some(existing) = current.matcher.get(method.as_str(), &route.path) {
                if existing.meta.route.name != route.name {
                    warn!(
                        route = %route.name,
                        method = %method,
                        path = %route.path,
                        bound_by = %existing.meta.route.name,
                        "Rejected mount of an already bound method and path"
                    );
                    return Err(Error::InvalidArgument(format!(
                        "{method} {} is already mounted by route `{}`",
                        route.path, existing.meta.route.name
                    )));
                }
            }

            let mut next = RouteTable::clone(&current);
            if let Some(old) = next.registry.remove(&route.name) {
                next.matcher.remove(old.method.as_str(), &old.path);
            }
            next.matcher.insert(
                method.as_str(),
                &route.path,
                Binding {
                    chain,
                    meta: BindingMeta {
                        route: Arc::clone(&route),
                    },
                },
            );
            next.registry.insert(Arc::clone(&route));
            self.table.store(Arc::new(next));

            // Still under the writer lock, so notifications follow publish order
            for observer in self.observers.load().iter() {
                observer.on_mount(method, &route.path);
            }
        }

        info!(
            route = %route.name,
            method = %method,
            path = %route.path,
            handlers = route.chain.len(),
            "Route mounted"
        );

        Ok(route)
    }

    /// Unmount a route by name
    ///
    /// Returns the removed route, or `None` if the name is not registered.
    pub fn unmount(&self, name: &str) -> Option<Arc<Route>> {
        let route = {
            let _writer = self.write_lock.lock();
            let current = self.table.load_full();
            let route = Arc::clone(current.registry.get(name)?);

            let mut next = RouteTable::clone(&current);
            next.matcher.remove(route.method.as_str(), &route.path);
            next.registry.remove(name);
            self.table.store(Arc::new(next));
            route
        };

        info!(
            route = %route.name,
            method = %route.method,
            path = %route.path,
            "Route unmounted"
        );
        Some(route)
    }

    /// Dispatch a request
    ///
    /// On a match the extracted path parameters are merged into
    /// `req.params` (matched values win), the route is attached to the
    /// request, observers get `on_routed`, and the route's chain runs with
    /// `done` as its continuation. On a miss the fallback policy answers
    /// through `done` directly.
    pub fn lookup<F>(&self, mut req: Request, res: Response, done: F)
    where
        F: Fn(Option<DispatchError>, Request, Response) + Send + Sync + 'static,
    {
        let done: Continuation = Arc::new(done);
        let table = self.table.load_full();

        let sink = if req.trace { self.probe.read().clone() } else { None };
        let id = sink.as_ref().map(|_| probe::correlation_id(&mut req));

        if let (Some(sink), Some(id)) = (&sink, &id) {
            sink.route_start(&RouteStart {
                server: &self.config.name,
                id,
                method: req.method,
                url: req.url(),
                headers: &req.headers[..],
            });
        }

        let hit = table
            .matcher
            .find(req.method.as_str(), &req.path)
            .map(|m| (m.value.clone(), m.params));

        if let (Some(sink), Some(id)) = (&sink, &id) {
            sink.route_done(&RouteDone {
                server: &self.config.name,
                id,
                route: hit.as_ref().map(|(b, _)| b.meta.route.name.as_str()),
                status: res.status,
                headers: &res.headers[..],
            });
        }

        let Some((binding, params)) = hit else {
            self.apply_fallback(&table, req, res, done);
            return;
        };
        drop(table);

        req.params.extend(params);
        req.route = Some(Arc::clone(&binding.meta.route));

        debug!(
            route = %binding.meta.route.name,
            method = %req.method,
            path = %req.path,
            "Route matched"
        );

        for observer in self.observers.load().iter() {
            observer.on_routed(&req, &res, &binding.meta.route);
        }

        binding.chain.execute(req, res, done);
    }

    /// Dispatch a request straight to a named route
    ///
    /// An unknown name completes with `ResourceNotFound` for that name.
    pub fn lookup_by_name<F>(&self, name: &str, mut req: Request, res: Response, done: F)
    where
        F: Fn(Option<DispatchError>, Request, Response) + Send + Sync + 'static,
    {
        let route = self.table.load().registry.get(name).cloned();
        let Some(route) = route else {
            debug!(route = %name, "No route registered under name");
            done(
                Some(DispatchError::ResourceNotFound {
                    path: name.to_string(),
                }),
                req,
                res,
            );
            return;
        };

        req.route = Some(Arc::clone(&route));
        route.chain.execute(req, res, Arc::new(done));
    }

    /// Run the fallback policy for a request that matched nothing
    pub fn default_route<F>(&self, req: Request, res: Response, done: F)
    where
        F: Fn(Option<DispatchError>, Request, Response) + Send + Sync + 'static,
    {
        let table = self.table.load_full();
        self.apply_fallback(&table, req, res, Arc::new(done));
    }

    fn apply_fallback(&self, table: &RouteTable, req: Request, mut res: Response, done: Continuation) {
        match fallback::resolve(&table.matcher, req.method, &req.path) {
            Fallback::Preflight => {
                debug!(path = %req.path, "CORS preflight answered");
                res.status = StatusCode::OK;
                done(None, req, res);
            }
            Fallback::MethodNotAllowed(allowed) => {
                debug!(
                    method = %req.method,
                    path = %req.path,
                    allowed = %fallback::allow_header(&allowed),
                    "Method not allowed"
                );
                res.set_header("Allow", fallback::allow_header(&allowed));
                res.allowed_methods = allowed.clone();
                let err = DispatchError::MethodNotAllowed {
                    method: req.method,
                    allowed,
                };
                done(Some(err), req, res);
            }
            Fallback::NotFound => {
                debug!(method = %req.method, path = %req.path, "No route matched");
                let err = DispatchError::ResourceNotFound {
                    path: req.path.clone(),
                };
                done(Some(err), req, res);
            }
        }
    }

    /// Register a lifecycle observer
    pub fn subscribe(&self, observer: Arc<dyn RouterObserver>) {
        self.observers.rcu(|current| {
            let mut observers = Vec::clone(current);
            observers.push(Arc::clone(&observer));
            observers
        });
    }

    /// Install the probe sink used for traced requests
    pub fn set_probe(&self, probe: Arc<dyn Probe>) {
        *self.probe.write() = Some(probe);
    }

    pub fn clear_probe(&self) {
        *self.probe.write() = None;
    }

    /// Route registered under `name`
    pub fn route(&self, name: &str) -> Option<Arc<Route>> {
        self.table.load().registry.get(name).cloned()
    }

    /// Snapshot of all registered routes by name
    pub fn routes(&self) -> Routes {
        Routes {
            table: self.table.load_full(),
        }
    }

    /// Introspection records for every route, sorted by name
    pub fn debug_info(&self) -> Vec<RouteDebugInfo> {
        let table = self.table.load();
        table
            .registry
            .names()
            .into_iter()
            .filter_map(|name| table.registry.get(name))
            .map(|route| route.debug_info())
            .collect()
    }

    /// [`debug_info`](Self::debug_info) rendered as pretty JSON
    pub fn debug_info_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.debug_info())
    }

    pub fn len(&self) -> usize {
        self.table.load().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

/// Dump of the matcher structure
impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table.load().matcher)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("routes", &self.routes())
            .finish_non_exhaustive()
    }
}
