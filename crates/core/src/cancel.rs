//! The cancel state machine shared by every cancelable context.
//!
//! States are `Live` and `Terminal(reason)`; terminal is absorbing. The
//! reason and the pending deadline timer sit behind one mutex so that they
//! transition together, and every source of termination goes through
//! [`CancelState::cancel`].

use crate::{ContextError, Done};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Terminal reason, deadline timer and done-signal of one context node.
#[derive(Debug, Default)]
pub struct CancelState {
    signal: CancellationToken,
    inner: Mutex<Terminal>,
}

#[derive(Debug, Default)]
struct Terminal {
    err: Option<ContextError>,
    timer: Option<AbortHandle>,
}

impl CancelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> Done {
        Done::from_token(self.signal.clone())
    }

    pub fn err(&self) -> Option<ContextError> {
        self.lock().err.clone()
    }

    /// Move to `Terminal(reason)` unless already terminal.
    ///
    /// Returns `true` when this call recorded the reason. Later callers are
    /// ignored. The done-signal fires and any armed timer is aborted while
    /// the lock is held.
    ///
    /// # Panics
    ///
    /// When `reason` is `None`. Every caller must name why the context
    /// stopped; a parent whose signal fired without a reason breaks the
    /// context contract.
    pub fn cancel(&self, reason: impl Into<Option<ContextError>>) -> bool {
        let Some(reason) = reason.into() else {
            panic!("ctxjoin: internal error: missing cancel error");
        };

        let mut inner = self.lock();
        if inner.err.is_some() {
            return false;
        }

        trace!(%reason, "context terminated");
        inner.err = Some(reason);
        self.signal.cancel();
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        true
    }

    /// Schedule `cancel(DeadlineExceeded)` at `deadline`.
    ///
    /// The timer holds only a weak reference to the state. It is aborted by
    /// any terminal transition, and arming an already terminal state is a
    /// no-op. Requires a Tokio runtime.
    pub fn arm_timer(self: &Arc<Self>, deadline: Instant) {
        let state = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(state) = state.upgrade() {
                state.cancel(ContextError::DeadlineExceeded);
            }
        });

        let mut inner = self.lock();
        if inner.err.is_some() {
            task.abort();
            return;
        }
        if let Some(previous) = inner.timer.replace(task.abort_handle()) {
            previous.abort();
        }
    }

    /// Whether a deadline timer is currently pending.
    pub fn timer_armed(&self) -> bool {
        self.lock().timer.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Terminal> {
        // Every critical section leaves `Terminal` consistent, so a poisoned
        // guard is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Idempotent trigger returned alongside a derived context.
///
/// Cloneable, callable from any thread, any number of times. The first call
/// that wins the race records [`ContextError::Canceled`].
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    state: Option<Arc<CancelState>>,
}

impl CancelHandle {
    pub fn new(state: Arc<CancelState>) -> Self {
        Self { state: Some(state) }
    }

    /// Trigger for a context that can never be canceled.
    pub fn noop() -> Self {
        Self { state: None }
    }

    pub fn is_noop(&self) -> bool {
        self.state.is_none()
    }

    pub fn cancel(&self) {
        if let Some(state) = &self.state {
            state.cancel(ContextError::Canceled);
        }
    }
}
