//! Standard derivation helpers.
//!
//! `background()` is the root every tree starts from. The `with_*` helpers
//! derive a child that inherits its parent's cancellation, deadline and
//! values, and adds one thing of its own.

use crate::{CancelHandle, CancelState, Context, ContextError, Ctx, Done, Value};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Root context: never canceled, no deadline, no values.
pub fn background() -> Ctx {
    Arc::new(Background)
}

/// Child of `parent` that additionally maps `key` to `value`.
///
/// The child's own key shadows the same key further up the tree.
pub fn with_value(parent: Ctx, key: impl Into<String>, value: impl Any + Send + Sync) -> Ctx {
    Arc::new(ValueCtx {
        parent,
        key: key.into(),
        value: Arc::new(value),
    })
}

/// Cancelable child of `parent`.
pub fn with_cancel(parent: Ctx) -> (Ctx, CancelHandle) {
    let (ctx, state) = CancelCtx::derive(parent, None);
    (ctx, CancelHandle::new(state))
}

/// Cancelable child whose terminal reason is supplied by the caller.
pub fn with_cancel_cause(parent: Ctx) -> (Ctx, CauseHandle) {
    let (ctx, state) = CancelCtx::derive(parent, None);
    (ctx, CauseHandle { state })
}

/// Child that stops at `at`, or earlier if `parent` does.
pub fn with_deadline(parent: Ctx, at: Instant) -> (Ctx, CancelHandle) {
    let (ctx, state) = CancelCtx::derive(parent, Some(at));
    (ctx, CancelHandle::new(state))
}

/// [`with_deadline`] at `now + timeout`.
pub fn with_timeout(parent: Ctx, timeout: Duration) -> (Ctx, CancelHandle) {
    with_deadline(parent, Instant::now() + timeout)
}

/// Trigger returned by [`with_cancel_cause`].
#[derive(Debug, Clone)]
pub struct CauseHandle {
    state: Arc<CancelState>,
}

impl CauseHandle {
    /// Stop the context with [`ContextError::Cause`]. No-op once terminal.
    pub fn cancel(&self, cause: impl Into<Arc<str>>) {
        self.state.cancel(ContextError::Cause(cause.into()));
    }
}

#[derive(Debug)]
struct Background;

impl Context for Background {
    fn deadline(&self) -> Option<Instant> {
        None
    }

    fn done(&self) -> Done {
        Done::never()
    }

    fn err(&self) -> Option<ContextError> {
        None
    }

    fn value(&self, _key: &str) -> Option<Value> {
        None
    }
}

#[derive(Debug)]
struct ValueCtx {
    parent: Ctx,
    key: String,
    value: Value,
}

impl Context for ValueCtx {
    fn deadline(&self) -> Option<Instant> {
        self.parent.deadline()
    }

    fn done(&self) -> Done {
        self.parent.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.parent.err()
    }

    fn value(&self, key: &str) -> Option<Value> {
        if self.key == key {
            return Some(self.value.clone());
        }
        self.parent.value(key)
    }
}

#[derive(Debug)]
struct CancelCtx {
    parent: Ctx,
    state: Arc<CancelState>,
    /// Own deadline; `None` when the parent's is at least as early.
    deadline: Option<Instant>,
}

impl CancelCtx {
    fn derive(parent: Ctx, deadline: Option<Instant>) -> (Ctx, Arc<CancelState>) {
        let deadline = match (deadline, parent.deadline()) {
            (Some(own), Some(inherited)) if inherited <= own => None,
            (own, _) => own,
        };

        let state = Arc::new(CancelState::new());
        let ctx: Ctx = Arc::new(CancelCtx {
            parent: parent.clone(),
            state: state.clone(),
            deadline,
        });

        if let Some(err) = parent.err() {
            debug!(reason = %err, "parent already terminal, child starts terminal");
            state.cancel(err);
            return (ctx, state);
        }

        if let Some(at) = deadline {
            if at <= Instant::now() {
                debug!("deadline already passed, child starts terminal");
                state.cancel(ContextError::DeadlineExceeded);
                return (ctx, state);
            }
            state.arm_timer(at);
        }

        if !parent.done().is_never() {
            propagate(parent, state.clone());
        }

        (ctx, state)
    }
}

impl Context for CancelCtx {
    fn deadline(&self) -> Option<Instant> {
        self.deadline.or_else(|| self.parent.deadline())
    }

    fn done(&self) -> Done {
        self.state.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.state.err()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.parent.value(key)
    }
}

/// Forward `parent`'s termination into `state`. Exits when either stops.
fn propagate(parent: Ctx, state: Arc<CancelState>) {
    let parent_done = parent.done();
    let own_done = state.done();

    tokio::spawn(async move {
        tokio::select! {
            _ = parent_done.fired() => {
                state.cancel(parent.err());
            }
            _ = own_done.fired() => {
                trace!("child stopped before its parent");
            }
        }
    });
}
