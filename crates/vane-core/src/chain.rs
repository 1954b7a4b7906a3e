//! Handler chains
//!
//! A chain runs its handlers one at a time, in append order. Each handler
//! receives the request, the response and a [`Next`] token, and advances
//! the chain only by signalling on that token:
//!
//! - [`Next::proceed`] runs the following handler, or completes the
//!   dispatch after the last one
//! - [`Next::stop`] completes the dispatch without running the rest
//! - [`Next::fail`] completes the dispatch with the handler's error
//!
//! `Next` is owned and `Send`, so a handler may move it into a task and
//! signal once its asynchronous work is done. A signal given before the
//! handler returns takes effect when it returns. A handler that never signals
//! leaves the dispatch pending.

use crate::{DispatchError, HandlerError, Request, Response};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handler function type
pub type HandlerFn = dyn Fn(Request, Response, Next) + Send + Sync;

/// Completion callback of a dispatch: `(error, request, response)`
pub type Continuation = Arc<dyn Fn(Option<DispatchError>, Request, Response) + Send + Sync>;

/// A single step of a chain
#[derive(Clone)]
pub struct Handler {
    name: Option<String>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Anonymous handler; the router names it when mounting
    pub fn new(func: impl Fn(Request, Response, Next) + Send + Sync + 'static) -> Self {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }

    /// Handler with an explicit name, shown in debug info
    pub fn named(
        name: impl Into<String>,
        func: impl Fn(Request, Response, Next) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered handler list owned by one route
#[derive(Debug)]
pub struct HandlerChain {
    handlers: Vec<Handler>,
    strict: bool,
}

impl HandlerChain {
    /// Create an empty chain
    ///
    /// With `strict` set, signalling twice on the same [`Next`] is reported
    /// and ignored instead of re-running the rest of the chain.
    pub fn new(strict: bool) -> Self {
        Self {
            handlers: Vec::new(),
            strict,
        }
    }

    pub fn append(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Handler identifiers in execution order
    pub fn handler_names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|h| h.name().unwrap_or("anonymous").to_string())
            .collect()
    }

    /// Run the chain from its first handler
    ///
    /// `done` is invoked when a handler stops or fails the chain, or when
    /// the last handler proceeds. An empty chain completes immediately.
    pub fn execute(self: &Arc<Self>, req: Request, res: Response, done: Continuation) {
        let dispatch = Arc::new(Dispatch {
            chain: Arc::clone(self),
            done,
        });
        run(&dispatch, 0, req, res);
    }
}

struct Dispatch {
    chain: Arc<HandlerChain>,
    done: Continuation,
}

/// Signal state of one chain step, shared by every clone of its [`Next`]
#[derive(Default)]
struct Step {
    fired: AtomicBool,
    state: Mutex<StepState>,
}

#[derive(Default)]
struct StepState {
    /// The handler function has returned
    returned: bool,
    /// `proceed` calls made before it returned
    deferred: Vec<(Request, Response)>,
}

/// Drive the chain from `index`
///
/// A handler that proceeds before returning only queues its request here,
/// and this loop runs the following handler once it returns. Synchronous
/// chains therefore run at constant stack depth. A handler that proceeds
/// later, from another task, resumes the chain with a fresh loop.
fn run(dispatch: &Arc<Dispatch>, index: usize, req: Request, res: Response) {
    let mut pending = vec![(index, req, res)];

    while let Some((index, req, res)) = pending.pop() {
        let Some(handler) = dispatch.chain.handlers.get(index) else {
            (dispatch.done)(None, req, res);
            continue;
        };

        let step = Arc::new(Step::default());
        let next = Next {
            dispatch: Arc::clone(dispatch),
            index,
            step: Arc::clone(&step),
        };
        (handler.func)(req, res, next);

        let deferred = {
            let mut state = step.state.lock();
            state.returned = true;
            std::mem::take(&mut state.deferred)
        };
        pending.extend(
            deferred
                .into_iter()
                .rev()
                .map(|(req, res)| (index + 1, req, res)),
        );
    }
}

/// Continuation token given to the handler at one position of a chain
///
/// Clones share the same signal: only the first signal across all clones
/// counts when the chain is strict.
#[derive(Clone)]
pub struct Next {
    dispatch: Arc<Dispatch>,
    index: usize,
    step: Arc<Step>,
}

impl Next {
    /// Continue with the next handler
    ///
    /// Called from inside the handler, the next handler starts once the
    /// current one returns.
    pub fn proceed(self, req: Request, res: Response) {
        if !self.arm() {
            return;
        }
        let mut state = self.step.state.lock();
        if state.returned {
            drop(state);
            run(&self.dispatch, self.index + 1, req, res);
        } else {
            state.deferred.push((req, res));
        }
    }

    /// End the chain successfully, skipping the remaining handlers
    pub fn stop(self, req: Request, res: Response) {
        if self.arm() {
            (self.dispatch.done)(None, req, res);
        }
    }

    /// End the chain with an error
    pub fn fail(self, err: impl Into<HandlerError>, req: Request, res: Response) {
        if self.arm() {
            (self.dispatch.done)(Some(DispatchError::Handler(err.into())), req, res);
        }
    }

    /// Name of the handler holding this token
    pub fn handler_name(&self) -> &str {
        self.dispatch.chain.handlers[self.index]
            .name()
            .unwrap_or("anonymous")
    }

    fn arm(&self) -> bool {
        if !self.step.fired.swap(true, Ordering::AcqRel) {
            return true;
        }
        if self.dispatch.chain.strict {
            tracing::error!(
                handler = %self.handler_name(),
                position = self.index,
                "Continuation invoked more than once; ignoring repeated call"
            );
            false
        } else {
            tracing::debug!(
                handler = %self.handler_name(),
                position = self.index,
                "Continuation invoked again"
            );
            true
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("handler", &self.handler_name())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
