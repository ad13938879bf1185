//! Construction of combined contexts.
//!
//! [`Combinator::combine`] snapshots both parents synchronously and only
//! spawns a watcher when the node can still stop later:
//! 1. Neither parent has a signal: permanently live node, no-op trigger.
//! 2. A parent is already terminal: the node adopts its reason (primary
//!    checked first).
//! 3. The effective deadline has passed: the node starts with
//!    [`ContextError::DeadlineExceeded`].
//! 4. Otherwise arm the deadline timer (if enabled) and spawn one watcher.

use crate::node::Combined;
use crate::watcher;
use ctxjoin_config::CombinatorConfig;
use ctxjoin_core::{CancelHandle, CancelState, Context, ContextError, Ctx, Mode};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, debug_span};

/// Combine in [`Mode::Pair`]: earliest deadline, own deadline timer.
pub fn pair(primary: Ctx, secondary: Ctx) -> (Ctx, CancelHandle) {
    Combinator::new(Mode::Pair).combine(primary, secondary)
}

/// Combine in [`Mode::Union`]: primary's deadline first, no own timer.
pub fn union(primary: Ctx, secondary: Ctx) -> (Ctx, CancelHandle) {
    Combinator::new(Mode::Union).combine(primary, secondary)
}

/// Combine with the default settings of `mode`.
pub fn combine(mode: Mode, primary: Ctx, secondary: Ctx) -> (Ctx, CancelHandle) {
    Combinator::new(mode).combine(primary, secondary)
}

/// Reusable combination settings.
#[derive(Debug, Clone)]
pub struct Combinator {
    mode: Mode,
    deadline_timer: bool,
    label: String,
}

impl Default for Combinator {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl Combinator {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            deadline_timer: mode.arms_deadline_timer(),
            label: "ctxjoin".into(),
        }
    }

    pub fn from_config(config: &CombinatorConfig) -> Self {
        Self {
            mode: config.mode,
            deadline_timer: config.arms_deadline_timer(),
            label: config.watcher_label.clone(),
        }
    }

    /// Override whether nodes arm their own deadline timer.
    pub fn with_deadline_timer(mut self, enabled: bool) -> Self {
        self.deadline_timer = enabled;
        self
    }

    /// Label recorded on the watcher's tracing span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Merge `primary` and `secondary` into one context.
    ///
    /// The handle stops the node with [`ContextError::Canceled`]; it is a
    /// no-op when neither parent can be canceled.
    pub fn combine(&self, primary: Ctx, secondary: Ctx) -> (Ctx, CancelHandle) {
        let (node, handle) = self.build(primary, secondary);
        let node: Ctx = node;
        (node, handle)
    }

    /// Like [`Combinator::combine`], keeping the concrete node type.
    pub fn build(&self, primary: Ctx, secondary: Ctx) -> (Arc<Combined>, CancelHandle) {
        if primary.done().is_never() && secondary.done().is_never() {
            debug!(mode = %self.mode, "neither parent is cancelable");
            let node = Combined::new(primary, secondary, self.mode, None);
            return (Arc::new(node), CancelHandle::noop());
        }

        let state = Arc::new(CancelState::new());
        let node = Arc::new(Combined::new(
            primary.clone(),
            secondary.clone(),
            self.mode,
            Some(state.clone()),
        ));
        let handle = CancelHandle::new(state.clone());

        if let Some(err) = primary.err().or_else(|| secondary.err()) {
            debug!(mode = %self.mode, reason = %err, "parent already terminal");
            state.cancel(err);
            return (node, handle);
        }

        if let Some(deadline) = node.deadline() {
            if deadline <= Instant::now() {
                debug!(mode = %self.mode, "deadline already passed");
                state.cancel(ContextError::DeadlineExceeded);
                return (node, handle);
            }
            if self.deadline_timer {
                state.arm_timer(deadline);
            }
        }

        let span = debug_span!("watcher", label = %self.label, mode = %self.mode);
        watcher::spawn(primary, secondary, state, span);

        (node, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxjoin_core::{ContextExt, background, with_cancel, with_timeout, with_value};
    use std::time::Duration;

    async fn wait_done(ctx: &Ctx) {
        tokio::time::timeout(Duration::from_secs(1), ctx.done().fired())
            .await
            .expect("combined context did not stop in time");
    }

    #[test]
    fn non_cancelable_parents_take_fast_path() {
        // No runtime: the fast path must not spawn.
        let left = with_value(background(), "k", 1_u8);
        for mode in [Mode::Pair, Mode::Union] {
            let (node, cancel) = Combinator::new(mode).build(left.clone(), background());
            assert!(!node.is_cancelable());
            assert!(cancel.is_noop());

            cancel.cancel();
            assert!(node.done().is_never());
            assert_eq!(node.err(), None);
        }
    }

    #[test]
    fn union_checks_both_parents_for_signals() {
        let (right, cancel_right) = with_cancel(background());
        cancel_right.cancel();

        let (node, cancel) = union(background(), right);
        assert!(!cancel.is_noop());
        assert_eq!(node.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn primary_error_checked_first() {
        let (left, cancel_left) = ctxjoin_core::with_cancel_cause(background());
        let (right, cancel_right) = ctxjoin_core::with_cancel_cause(background());
        cancel_left.cancel("left");
        cancel_right.cancel("right");

        let (node, _) = pair(left.clone(), right.clone());
        assert_eq!(node.err(), Some(ContextError::cause("left")));
        assert!(node.done().is_fired());

        let (node, _) = pair(right, left);
        assert_eq!(node.err(), Some(ContextError::cause("right")));
    }

    #[tokio::test(start_paused = true)]
    async fn pair_arms_own_timer() {
        let (left, _c) = with_timeout(background(), Duration::from_millis(50));
        let (node, _cancel) = Combinator::new(Mode::Pair).build(left, background());
        assert!(node.timer_armed());

        let node: Ctx = node;
        wait_done(&node).await;
        assert_eq!(node.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn union_relies_on_parent_expiry() {
        let (left, _c) = with_timeout(background(), Duration::from_millis(50));
        let (node, _cancel) = Combinator::new(Mode::Union).build(left, background());
        assert!(!node.timer_armed());

        let node: Ctx = node;
        wait_done(&node).await;
        assert_eq!(node.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_override_applies() {
        let (left, _c) = with_timeout(background(), Duration::from_millis(50));

        let union_with_timer = Combinator::new(Mode::Union).with_deadline_timer(true);
        let (node, _) = union_with_timer.build(left.clone(), background());
        assert!(node.timer_armed());

        let pair_without_timer = Combinator::new(Mode::Pair).with_deadline_timer(false);
        let (node, _) = pair_without_timer.build(left, background());
        assert!(!node.timer_armed());
    }

    #[tokio::test]
    async fn explicit_cancel_disarms_timer() {
        let (left, _c) = with_timeout(background(), Duration::from_secs(60));
        let (node, cancel) = Combinator::new(Mode::Pair).build(left.clone(), background());
        assert!(node.timer_armed());

        cancel.cancel();
        assert!(!node.timer_armed());
        assert_eq!(node.err(), Some(ContextError::Canceled));
        assert!(left.is_live());
    }

    #[test]
    fn from_config_uses_settings() {
        let config = CombinatorConfig {
            mode: Mode::Union,
            deadline_timer: Some(true),
            watcher_label: "jobs".into(),
        };
        let combinator = Combinator::from_config(&config);
        assert_eq!(combinator.mode(), Mode::Union);
        assert!(combinator.deadline_timer);
        assert_eq!(combinator.label, "jobs");
    }
}
