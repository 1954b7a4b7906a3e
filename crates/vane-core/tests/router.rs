//! Router behaviour through the public API

mod common;

use common::{dispatch, dispatch_all, init_tracing, pass, tagging};
use parking_lot::Mutex;
use std::sync::Arc;
use vane_core::{
    DispatchError, Error, Handler, Method, Probe, Request, RequestBuilder, Response, Route,
    RouteDone, RouteSpec, RouteStart, Router, RouterConfig, RouterObserver, StatusCode,
};

#[test]
fn test_handlers_run_in_order_with_params() {
    init_tracing();
    let router = Router::default();
    router
        .mount(
            RouteSpec::new("getUser", "GET", "/users/:id"),
            vec![
                tagging("auth"),
                tagging("load"),
                Handler::named("render", |req, mut res, next| {
                    let body = format!(
                        "{}user={}",
                        res.body_string().unwrap_or_default(),
                        req.param("id").unwrap_or("?")
                    );
                    res.body = body.into();
                    next.proceed(req, res);
                }),
            ],
        )
        .unwrap();

    let out = dispatch(&router, Request::new(Method::Get, "/users/42"));
    assert!(out.err.is_none());
    assert_eq!(out.res.body_string().as_deref(), Some("auth;load;user=42"));
    assert_eq!(out.req.param("id"), Some("42"));
    assert_eq!(out.req.route_name(), Some("getUser"));
}

#[test]
fn test_unmount_behaves_as_never_mounted() {
    let router = Router::default();
    router.mount(RouteSpec::new("a", "GET", "/a"), vec![pass()]).unwrap();
    router.mount(RouteSpec::new("b", "POST", "/b"), vec![pass()]).unwrap();

    let removed = router.unmount("a").unwrap();
    assert_eq!(removed.name, "a");
    assert!(router.route("a").is_none());
    assert!(!router.routes().contains_key("a"));

    let out = dispatch(&router, Request::new(Method::Get, "/a"));
    assert!(matches!(out.err, Some(DispatchError::ResourceNotFound { ref path }) if path == "/a"));

    // Unknown names are a no-op
    assert!(router.unmount("a").is_none());
    assert!(router.unmount("nope").is_none());
    assert_eq!(router.len(), 1);
}

#[test]
fn test_preflight_succeeds_on_any_table() {
    let empty = Router::default();
    let out = dispatch(&empty, Request::new(Method::Options, "*"));
    assert!(out.err.is_none());
    assert_eq!(out.res.status, StatusCode::OK);

    let router = Router::default();
    router.mount(RouteSpec::new("all", "GET", "/*rest"), vec![pass()]).unwrap();
    let out = dispatch(&router, Request::new(Method::Options, "*"));
    assert!(out.err.is_none());
    assert!(out.req.route.is_none());
}

#[test]
fn test_method_not_allowed_sets_allow_header() {
    let router = Router::default();
    router.mount(RouteSpec::new("x", "GET", "/x"), vec![pass()]).unwrap();

    let out = dispatch(&router, Request::new(Method::Post, "/x"));
    let err = out.err.expect("405 expected");
    assert!(err.is_method_not_allowed());
    assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(err.to_string(), "POST is not allowed");
    match err {
        DispatchError::MethodNotAllowed { method, allowed } => {
            assert_eq!(method, Method::Post);
            assert_eq!(allowed, vec![Method::Get]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(out.res.header("Allow"), Some("GET"));
    assert_eq!(out.res.allowed_methods, vec![Method::Get]);
}

#[test]
fn test_allow_header_lists_every_method_in_order() {
    let router = Router::default();
    router.mount(RouteSpec::new("del", "DELETE", "/items/:id"), vec![pass()]).unwrap();
    router.mount(RouteSpec::new("get", "GET", "/items/:id"), vec![pass()]).unwrap();
    router.mount(RouteSpec::new("put", "PUT", "/items/:id"), vec![pass()]).unwrap();

    let out = dispatch(&router, Request::new(Method::Patch, "/items/3"));
    assert_eq!(out.res.header("allow"), Some("GET, PUT, DELETE"));
}

#[test]
fn test_not_found() {
    let router = Router::default();
    router.mount(RouteSpec::new("x", "GET", "/x"), vec![pass()]).unwrap();

    let out = dispatch(&router, Request::new(Method::Get, "/missing"));
    let err = out.err.expect("404 expected");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "/missing does not exist");
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert!(out.res.header("Allow").is_none());
}

#[test]
fn test_debug_info_lists_handlers() {
    let router = Router::default();
    router
        .mount(RouteSpec::new("r1", "GET", "/a"), vec![pass(), pass()])
        .unwrap();
    router
        .mount(RouteSpec::new("r2", "POST", "/b"), vec![tagging("audit")])
        .unwrap();

    let info = router.debug_info();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].name, "r1");
    assert_eq!(info[0].method, "get");
    assert_eq!(info[0].path, "/a");
    assert_eq!(info[0].handlers, vec!["handler-0", "handler-1"]);
    assert_eq!(info[1].handlers, vec!["audit"]);

    let json: serde_json::Value = serde_json::from_str(&router.debug_info_json().unwrap()).unwrap();
    assert_eq!(json[0]["method"], "get");
    assert_eq!(json[1]["name"], "r2");
}

#[test]
fn test_display_dumps_matcher() {
    let router = Router::default();
    router.mount(RouteSpec::new("user", "GET", "/users/:id"), vec![pass()]).unwrap();

    let dump = router.to_string();
    assert!(dump.starts_with("GET /"));
    assert!(dump.contains(":id [bound]"));
}

#[test]
fn test_remount_replaces_route() {
    let router = Router::default();
    router.mount(RouteSpec::new("r", "GET", "/old"), vec![tagging("v1")]).unwrap();
    router.mount(RouteSpec::new("r", "GET", "/new"), vec![tagging("v2")]).unwrap();

    assert_eq!(router.len(), 1);
    let out = dispatch(&router, Request::new(Method::Get, "/old"));
    assert!(out.err.unwrap().is_not_found());
    let out = dispatch(&router, Request::new(Method::Get, "/new"));
    assert_eq!(out.res.body_string().as_deref(), Some("v2;"));

    router.unmount("r");
    router.mount(RouteSpec::new("r", "GET", "/old"), vec![tagging("v3")]).unwrap();
    let out = dispatch(&router, Request::new(Method::Get, "/old"));
    assert_eq!(out.res.body_string().as_deref(), Some("v3;"));
}

#[test]
fn test_duplicate_names_rejected_when_configured() {
    let router = Router::new(RouterConfig::new().reject_duplicate_names(true));
    router.mount(RouteSpec::new("r", "GET", "/a"), vec![pass()]).unwrap();

    let err = router.mount(RouteSpec::new("r", "GET", "/b"), vec![pass()]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(router.route("r").unwrap().path, "/a");
}

#[test]
fn test_conflicting_binding_rejected() {
    let router = Router::default();
    router.mount(RouteSpec::new("first", "GET", "/a"), vec![pass()]).unwrap();

    let err = router.mount(RouteSpec::new("second", "get", "/a"), vec![pass()]).unwrap_err();
    assert!(err.to_string().contains("first"));
    assert!(router.route("second").is_none());
    assert_eq!(router.len(), 1);
}

#[test]
fn test_invalid_mounts() {
    let router = Router::default();
    let cases = [
        (RouteSpec::new("", "GET", "/a"), vec![pass()]),
        (RouteSpec::new("a", "", "/a"), vec![pass()]),
        (RouteSpec::new("a", "GET", ""), vec![pass()]),
        (RouteSpec::new("a", "BREW", "/a"), vec![pass()]),
        (RouteSpec::new("a", "GET", "/a"), vec![]),
    ];
    for (spec, handlers) in cases {
        assert!(matches!(router.mount(spec, handlers), Err(Error::InvalidArgument(_))));
    }
    assert!(router.is_empty());
}

#[test]
fn test_matched_params_override_existing() {
    let router = Router::default();
    router.mount(RouteSpec::new("item", "GET", "/items/:id"), vec![pass()]).unwrap();

    let req = RequestBuilder::new(Method::Get, "/items/9")
        .param("id", "outer")
        .param("tenant", "acme")
        .build();
    let out = dispatch(&router, req);
    assert_eq!(out.req.param("id"), Some("9"));
    assert_eq!(out.req.param("tenant"), Some("acme"));
}

#[test]
fn test_sibling_routes_extract_their_own_param_names() {
    let router = Router::default();
    router.mount(RouteSpec::new("user", "GET", "/users/:id"), vec![pass()]).unwrap();
    router
        .mount(RouteSpec::new("posts", "GET", "/users/:userId/posts"), vec![pass()])
        .unwrap();

    let out = dispatch(&router, Request::new(Method::Get, "/users/5/posts"));
    assert_eq!(out.req.route_name(), Some("posts"));
    assert_eq!(out.req.param("userId"), Some("5"));
    assert_eq!(out.req.param("id"), None);

    let out = dispatch(&router, Request::new(Method::Get, "/users/5"));
    assert_eq!(out.req.param("id"), Some("5"));
    assert_eq!(out.req.param("userId"), None);

    router.unmount("user");
    let out = dispatch(&router, Request::new(Method::Get, "/users/9/posts"));
    assert_eq!(out.req.param("userId"), Some("9"));
    assert_eq!(out.req.params.len(), 1);
}

#[test]
fn test_lookup_by_name() {
    let router = Router::default();
    router.mount(RouteSpec::new("health", "GET", "/health"), vec![tagging("ok")]).unwrap();

    let out = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&out);
    // Method and path of the request are irrelevant when dispatching by name
    router.lookup_by_name("health", Request::new(Method::Post, "/other"), Response::ok(), move |err, req, res| {
        *sink.lock() = Some((err.is_none(), req.route_name().map(str::to_string), res.body_string()));
    });
    let (ok, name, body) = out.lock().take().unwrap();
    assert!(ok);
    assert_eq!(name.as_deref(), Some("health"));
    assert_eq!(body.as_deref(), Some("ok;"));

    let missing = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&missing);
    router.lookup_by_name("ghost", Request::new(Method::Get, "/"), Response::ok(), move |err, _req, _res| {
        *sink.lock() = err.map(|e| e.to_string());
    });
    assert_eq!(missing.lock().as_deref(), Some("ghost does not exist"));
}

#[test]
fn test_default_route_applies_fallback() {
    let router = Router::default();
    router.mount(RouteSpec::new("x", "GET", "/x"), vec![pass()]).unwrap();

    let outcome = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&outcome);
    router.default_route(Request::new(Method::Put, "/x"), Response::ok(), move |err, _req, res| {
        *sink.lock() = Some((err.map(|e| e.status_code()), res.header("Allow").map(str::to_string)));
    });
    let (status, allow) = outcome.lock().take().unwrap();
    assert_eq!(status, Some(StatusCode::METHOD_NOT_ALLOWED));
    assert_eq!(allow.as_deref(), Some("GET"));
}

#[test]
fn test_handler_error_reaches_continuation() {
    let router = Router::default();
    router
        .mount(
            RouteSpec::new("boom", "GET", "/boom"),
            vec![
                Handler::named("explode", |req, res, next| next.fail("database unavailable", req, res)),
                tagging("unreached"),
            ],
        )
        .unwrap();

    let out = dispatch(&router, Request::new(Method::Get, "/boom"));
    let err = out.err.expect("handler error expected");
    assert_eq!(err.to_string(), "database unavailable");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.handler_error().is_some());
    assert!(out.res.body_string().unwrap_or_default().is_empty());
}

#[test]
fn test_stop_short_circuits() {
    let router = Router::default();
    router
        .mount(
            RouteSpec::new("cached", "GET", "/cached"),
            vec![
                Handler::named("cache", |req, mut res, next| {
                    res.body = "hit".into();
                    next.stop(req, res);
                }),
                tagging("origin"),
            ],
        )
        .unwrap();

    let out = dispatch(&router, Request::new(Method::Get, "/cached"));
    assert!(out.err.is_none());
    assert_eq!(out.res.body_string().as_deref(), Some("hit"));
}

#[test]
fn test_strict_mode_ignores_second_signal() {
    let double = || {
        Handler::named("double", |req, res, next| {
            next.clone().proceed(req.clone(), res.clone());
            next.proceed(req, res);
        })
    };

    let strict = Router::default();
    strict.mount(RouteSpec::new("d", "GET", "/d"), vec![double()]).unwrap();
    assert_eq!(dispatch_all(&strict, Request::new(Method::Get, "/d")).len(), 1);

    let lenient = Router::new(RouterConfig::new().enforce_single_continuation_call(false));
    lenient.mount(RouteSpec::new("d", "GET", "/d"), vec![double()]).unwrap();
    assert_eq!(dispatch_all(&lenient, Request::new(Method::Get, "/d")).len(), 2);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl RouterObserver for Recorder {
    fn on_mount(&self, method: Method, path: &str) {
        self.events.lock().push(format!("mount {method} {path}"));
    }

    fn on_routed(&self, req: &Request, _res: &Response, route: &Route) {
        self.events
            .lock()
            .push(format!("routed {} {} -> {}", req.method, req.path, route.name));
    }
}

impl Probe for Recorder {
    fn route_start(&self, event: &RouteStart<'_>) {
        self.events
            .lock()
            .push(format!("start {} {} {} {}", event.server, event.id, event.method, event.url));
    }

    fn route_done(&self, event: &RouteDone<'_>) {
        self.events.lock().push(format!(
            "done {} {} {}",
            event.id,
            event.route.unwrap_or("-"),
            event.status.as_u16()
        ));
    }
}

#[test]
fn test_observers_see_mount_and_routed() {
    let router = Router::default();
    let recorder = Arc::new(Recorder::default());
    router.subscribe(recorder.clone());

    router.mount(RouteSpec::new("u", "GET", "/u/:id"), vec![pass()]).unwrap();
    dispatch(&router, Request::new(Method::Get, "/u/1"));
    dispatch(&router, Request::new(Method::Get, "/nothing"));

    assert_eq!(
        *recorder.events.lock(),
        vec!["mount GET /u/:id".to_string(), "routed GET /u/1 -> u".to_string()]
    );
}

#[test]
fn test_probes_fire_only_for_traced_requests() {
    let router = Router::new(RouterConfig::new().name("api"));
    let recorder = Arc::new(Recorder::default());
    router.set_probe(recorder.clone());
    router.mount(RouteSpec::new("u", "GET", "/u/:id"), vec![pass()]).unwrap();

    dispatch(&router, Request::new(Method::Get, "/u/1"));
    assert!(recorder.events.lock().is_empty());

    let req = RequestBuilder::new(Method::Get, "/u/1")
        .query("full=1")
        .header("X-Request-Id", "req-7")
        .trace()
        .build();
    let out = dispatch(&router, req);
    assert_eq!(out.req.id.as_deref(), Some("req-7"));

    let req = RequestBuilder::new(Method::Get, "/missing")
        .header("x-request-id", "req-8")
        .trace()
        .build();
    dispatch(&router, req);

    assert_eq!(
        *recorder.events.lock(),
        vec![
            "start api req-7 GET /u/1?full=1".to_string(),
            "done req-7 u 200".to_string(),
            "start api req-8 GET /missing".to_string(),
            "done req-8 - 200".to_string(),
        ]
    );

    router.clear_probe();
    let req = RequestBuilder::new(Method::Get, "/u/1").trace().build();
    let out = dispatch(&router, req);
    assert!(out.req.id.is_none());
    assert_eq!(recorder.events.lock().len(), 4);
}

#[test]
fn test_route_meta_kept_for_introspection() {
    let router = Router::default();
    let route = router
        .mount(
            RouteSpec::new("docs", "GET", "/docs").with("version", 2).with("public", true),
            vec![pass()],
        )
        .unwrap();

    assert_eq!(route.spec.meta["version"], 2);
    assert_eq!(router.routes()["docs"].spec.meta["public"], true);
}
