//! The broadcast-once done-signal.
//!
//! A [`Done`] either wraps a [`CancellationToken`] that fires exactly once
//! and never resets, or is the eternal handle of a context nobody can cancel.

use tokio_util::sync::CancellationToken;

/// Observer handle for a context's termination.
#[derive(Debug, Clone, Default)]
pub struct Done {
    signal: Option<CancellationToken>,
}

impl Done {
    /// A handle that never fires.
    pub fn never() -> Self {
        Self { signal: None }
    }

    pub(crate) fn from_token(token: CancellationToken) -> Self {
        Self {
            signal: Some(token),
        }
    }

    /// True when this handle belongs to a permanently non-cancelable context.
    pub fn is_never(&self) -> bool {
        self.signal.is_none()
    }

    /// Non-blocking check.
    pub fn is_fired(&self) -> bool {
        self.signal.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Wait until the signal fires. Pends forever for [`Done::never`].
    pub async fn fired(&self) {
        match &self.signal {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fired_resolves_after_token_cancel() {
        let token = CancellationToken::new();
        let done = Done::from_token(token.clone());
        assert!(!done.is_never());
        assert!(!done.is_fired());

        token.cancel();
        done.fired().await;
        assert!(done.is_fired());

        // Stays fired.
        done.fired().await;
        assert!(done.clone().is_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn never_does_not_fire() {
        let done = Done::never();
        assert!(done.is_never());
        assert!(!done.is_fired());

        let waited = tokio::time::timeout(Duration::from_secs(3600), done.fired()).await;
        assert!(waited.is_err());
    }
}
