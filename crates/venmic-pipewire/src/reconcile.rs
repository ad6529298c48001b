//! Background reconciliation: keeps links in line with the active rule as
//! streams come and go.

use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use venmic_core::{GraphBackend, Patchbay};

use crate::error::{PwError, PwResult};
use crate::monitor::GraphEvent;

/// Spawn the reconciler thread.
///
/// Each burst of routing-relevant events leads to a single
/// [`Patchbay::reconcile`] once `settle` has passed. The thread exits when
/// the event channel closes or the patchbay is dropped.
pub fn spawn_reconciler<B>(
    patchbay: Weak<Patchbay<B>>,
    mut events: mpsc::Receiver<GraphEvent>,
    settle: Duration,
) -> PwResult<JoinHandle<()>>
where
    B: GraphBackend + Send + Sync + 'static,
{
    std::thread::Builder::new()
        .name("venmic-reconcile".to_string())
        .spawn(move || {
            while let Some(event) = events.blocking_recv() {
                if !event.affects_routing() {
                    trace!(?event, "Ignoring event");
                    continue;
                }

                if !settle.is_zero() {
                    std::thread::sleep(settle);
                }

                let mut batched = 1;
                while events.try_recv().is_ok() {
                    batched += 1;
                }

                let Some(patchbay) = patchbay.upgrade() else {
                    break;
                };

                match patchbay.reconcile() {
                    Ok(Some(report)) if !report.is_noop() => info!(
                        events = batched,
                        created = report.created,
                        removed = report.removed,
                        failed = report.failures.len(),
                        "Reconciled after graph change"
                    ),
                    Ok(_) => trace!(events = batched, "Nothing to reconcile"),
                    Err(e) => warn!(error = %e, "Reconcile failed"),
                }
            }
            debug!("Reconciler stopped");
        })
        .map_err(|e| PwError::MainLoopError(format!("Failed to spawn reconciler: {e}")))
}
