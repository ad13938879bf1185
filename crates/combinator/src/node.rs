//! The combined context node.

use ctxjoin_core::{CancelState, Context, ContextError, Ctx, Done, Mode, Value};
use std::sync::Arc;
use tokio::time::Instant;

/// A context derived from two parents.
///
/// Holds no signal at all when neither parent can ever be canceled.
#[derive(Debug)]
pub struct Combined {
    primary: Ctx,
    secondary: Ctx,
    mode: Mode,
    state: Option<Arc<CancelState>>,
}

impl Combined {
    pub(crate) fn new(primary: Ctx, secondary: Ctx, mode: Mode, state: Option<Arc<CancelState>>) -> Self {
        Self {
            primary,
            secondary,
            mode,
            state,
        }
    }

    pub fn primary(&self) -> &Ctx {
        &self.primary
    }

    pub fn secondary(&self) -> &Ctx {
        &self.secondary
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// False for nodes built on the non-cancelable fast path.
    pub fn is_cancelable(&self) -> bool {
        self.state.is_some()
    }

    /// Whether this node's own deadline timer is pending.
    pub fn timer_armed(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.timer_armed())
    }
}

impl Context for Combined {
    /// Recomputed from the parents on every call.
    fn deadline(&self) -> Option<Instant> {
        self.mode
            .arbitrate(self.primary.deadline(), self.secondary.deadline())
    }

    fn done(&self) -> Done {
        match &self.state {
            Some(state) => state.done(),
            None => Done::never(),
        }
    }

    fn err(&self) -> Option<ContextError> {
        self.state.as_ref().and_then(|state| state.err())
    }

    /// Primary first, then secondary.
    ///
    /// A node combined with one of its own ancestors recurses without bound.
    fn value(&self, key: &str) -> Option<Value> {
        self.primary
            .value(key)
            .or_else(|| self.secondary.value(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxjoin_core::{ContextExt, background, with_timeout, with_value};
    use std::time::Duration;

    #[test]
    fn stateless_node_is_inert() {
        let node = Combined::new(background(), background(), Mode::Pair, None);
        assert!(!node.is_cancelable());
        assert!(node.done().is_never());
        assert_eq!(node.err(), None);
        assert_eq!(node.deadline(), None);
        assert!(!node.timer_armed());
    }

    #[test]
    fn primary_value_shadows_secondary() {
        let left = with_value(background(), "foo", "bar");
        let right = with_value(with_value(background(), "foo", "baz"), "only", 3_i64);
        let node = Combined::new(left, right, Mode::Pair, None);

        assert_eq!(*node.value_of::<&'static str>("foo").unwrap(), "bar");
        assert_eq!(*node.value_of::<i64>("only").unwrap(), 3);
        assert!(node.value("absent").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_follows_mode() {
        let (soon, _c1) = with_timeout(background(), Duration::from_millis(10));
        let (late, _c2) = with_timeout(background(), Duration::from_secs(10));

        let pair = Combined::new(late.clone(), soon.clone(), Mode::Pair, None);
        assert_eq!(pair.deadline(), soon.deadline());

        let union = Combined::new(late.clone(), soon.clone(), Mode::Union, None);
        assert_eq!(union.deadline(), late.deadline());
    }
}
