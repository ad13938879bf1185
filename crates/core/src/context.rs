//! The context capability contract.
//!
//! Every context exposes an optional deadline, a done-signal, a terminal
//! reason and a key-value lookup. Contexts are shared as [`Ctx`] handles and
//! are never mutated by the code that observes them.

use crate::{ContextError, Done};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// A value stored in a context.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Shared handle to any context.
pub type Ctx = Arc<dyn Context>;

/// Cancellation, deadline and value scope of an operation.
pub trait Context: Send + Sync + fmt::Debug {
    /// The instant at which this context will stop, if any.
    fn deadline(&self) -> Option<Instant>;

    /// Signal that fires once this context stops.
    fn done(&self) -> Done;

    /// `None` while live, the terminal reason afterwards.
    fn err(&self) -> Option<ContextError>;

    /// Look up `key` in this context and its ancestors.
    fn value(&self, key: &str) -> Option<Value>;
}

/// Convenience methods available on every context.
pub trait ContextExt: Context {
    /// Typed [`Context::value`]: `None` when absent or stored as another type.
    fn value_of<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.value(key)?.downcast::<T>().ok()
    }

    fn is_live(&self) -> bool {
        self.err().is_none()
    }
}

impl<C: Context + ?Sized> ContextExt for C {}
