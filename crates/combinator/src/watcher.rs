//! Background task forwarding the first parent termination into a node.

use ctxjoin_core::{CancelState, Ctx};
use std::sync::Arc;
use tracing::{Instrument, Span, debug, trace};

/// Race both parents' done-signals and the node's own.
///
/// Whichever parent fires first hands its reason to the node. The task exits
/// as soon as the node is terminal, whatever stopped it.
pub(crate) fn spawn(primary: Ctx, secondary: Ctx, state: Arc<CancelState>, span: Span) {
    let primary_done = primary.done();
    let secondary_done = secondary.done();
    let own_done = state.done();

    tokio::spawn(
        async move {
            tokio::select! {
                _ = primary_done.fired() => {
                    let won = state.cancel(primary.err());
                    debug!(won, "primary parent stopped");
                }
                _ = secondary_done.fired() => {
                    let won = state.cancel(secondary.err());
                    debug!(won, "secondary parent stopped");
                }
                _ = own_done.fired() => {
                    trace!("node stopped before either parent");
                }
            }
        }
        .instrument(span),
    );
}
