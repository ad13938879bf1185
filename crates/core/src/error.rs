//! Terminal reasons for contexts.
//!
//! A context has no recoverable errors: once it stops being live it records
//! one of these reasons and keeps it forever.

use std::sync::Arc;
use thiserror::Error;

/// Why a context stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// An explicit cancel trigger was invoked.
    #[error("context canceled")]
    Canceled,

    /// The effective deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A caller-supplied reason (see [`crate::with_cancel_cause`]).
    #[error("{0}")]
    Cause(Arc<str>),
}

impl ContextError {
    /// Build a caller-supplied terminal reason.
    pub fn cause(reason: impl Into<Arc<str>>) -> Self {
        Self::Cause(reason.into())
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}
