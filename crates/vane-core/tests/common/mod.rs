//! Shared helpers for router integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use vane_core::{DispatchError, Handler, Request, Response, Router};

/// Everything a continuation received for one dispatch.
#[derive(Debug)]
pub struct Outcome {
    pub err: Option<DispatchError>,
    pub req: Request,
    pub res: Response,
}

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Dispatch `req` and collect every continuation call.
pub fn dispatch_all(router: &Router, req: Request) -> Vec<Outcome> {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    router.lookup(req, Response::ok(), move |err, req, res| {
        sink.lock().push(Outcome { err, req, res });
    });
    let collected = std::mem::take(&mut *outcomes.lock());
    collected
}

/// Dispatch `req`, expecting exactly one continuation call.
pub fn dispatch(router: &Router, req: Request) -> Outcome {
    let mut outcomes = dispatch_all(router, req);
    assert_eq!(outcomes.len(), 1, "continuation must run exactly once");
    outcomes.pop().unwrap()
}

/// Handler that appends `tag` to the response body and proceeds.
pub fn tagging(tag: &'static str) -> Handler {
    Handler::named(tag, move |req, mut res, next| {
        let mut body = res.body_string().unwrap_or_default();
        body.push_str(tag);
        body.push(';');
        res.body = body.into();
        next.proceed(req, res);
    })
}

/// Anonymous handler that just proceeds.
pub fn pass() -> Handler {
    Handler::new(|req, res, next| next.proceed(req, res))
}
