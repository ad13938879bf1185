//! # ctxjoin core
//!
//! The context contract and the building blocks every context in ctxjoin is
//! made of: a broadcast-once done-signal, the terminal error taxonomy, and
//! the mutex-guarded cancel state machine.
//!
//! ## Design Philosophy
//!
//! A context is anything implementing [`Context`]. The combinator crate and
//! the derivation helpers in [`derive`] all build on the same
//! [`CancelState`], so every node records exactly one terminal reason no
//! matter which source stopped it:
//! - an explicit [`CancelHandle`] call
//! - a parent's own termination, forwarded by a watcher task
//! - an armed deadline timer

pub mod cancel;
pub mod context;
pub mod derive;
pub mod done;
pub mod error;
pub mod mode;

// Re-export key types at crate root for ergonomics
pub use cancel::{CancelHandle, CancelState};
pub use context::{Context, ContextExt, Ctx, Value};
pub use derive::{
    CauseHandle, background, with_cancel, with_cancel_cause, with_deadline, with_timeout,
    with_value,
};
pub use done::Done;
pub use error::ContextError;
pub use mode::Mode;
