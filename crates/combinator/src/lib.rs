//! # ctxjoin
//!
//! Merge two independent contexts into one derived context that stops when
//! either parent stops.
//!
//! ```ignore
//! let (call, _cancel_call) = ctxjoin::with_timeout(ctxjoin::background(), per_call);
//! let (ctx, cancel) = ctxjoin::pair(call, server_lifetime.clone());
//! // `ctx` is done as soon as the call times out or the server shuts down.
//! ```
//!
//! - Cancellation: the first parent to stop decides the terminal reason,
//!   propagated verbatim. The returned [`CancelHandle`] stops the node with
//!   [`ContextError::Canceled`].
//! - Deadline: see [`Mode`]. [`pair`] uses the earlier of the two.
//! - Values: the primary (left) parent shadows the secondary (right).
//!
//! Nodes with at least one cancelable parent run one watcher task, so they
//! must be created inside a Tokio runtime.

pub mod combinator;
pub mod node;
mod watcher;

pub use combinator::{Combinator, combine, pair, union};
pub use node::Combined;

pub use ctxjoin_config::{CombinatorConfig, ConfigError};
pub use ctxjoin_core::{
    CancelHandle, CancelState, CauseHandle, Context, ContextError, ContextExt, Ctx, Done, Mode,
    Value, background, with_cancel, with_cancel_cause, with_deadline, with_timeout, with_value,
};
