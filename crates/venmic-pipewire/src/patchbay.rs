//! Process-wide patchbay bound to the PipeWire server.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use venmic_core::{Config, Patchbay, Result, load_config};

use crate::reconcile::spawn_reconciler;
use crate::runtime::PipeWireRuntime;

/// The patchbay driven by the PipeWire runtime.
pub type PipeWirePatchbay = Patchbay<PipeWireRuntime>;

static INSTANCE: Mutex<Option<Arc<PipeWirePatchbay>>> = parking_lot::const_mutex(None);

/// The shared patchbay, connecting with the default config on first use.
pub fn instance() -> Result<Arc<PipeWirePatchbay>> {
    if let Some(patchbay) = INSTANCE.lock().as_ref() {
        return Ok(Arc::clone(patchbay));
    }
    instance_with(&load_config()?)
}

/// The shared patchbay, connecting with `config` on first use.
///
/// `config` is ignored once the patchbay exists. A failed connection is not
/// remembered: the next call tries again.
pub fn instance_with(config: &Config) -> Result<Arc<PipeWirePatchbay>> {
    get_or_try_init(&INSTANCE, || connect(config))
}

/// Return the value in `slot`, or fill it with `init`. Errors leave the slot
/// empty.
fn get_or_try_init<T, E>(
    slot: &Mutex<Option<Arc<T>>>,
    init: impl FnOnce() -> std::result::Result<Arc<T>, E>,
) -> std::result::Result<Arc<T>, E> {
    let mut slot = slot.lock();
    if let Some(value) = slot.as_ref() {
        return Ok(Arc::clone(value));
    }

    let value = init()?;
    *slot = Some(Arc::clone(&value));
    Ok(value)
}

/// Connect a new patchbay and start tracking graph changes.
fn connect(config: &Config) -> Result<Arc<PipeWirePatchbay>> {
    let (runtime, events) = PipeWireRuntime::spawn(config)?;

    // Let the virtual microphone and the initial globals arrive
    if let Err(e) = runtime.sync() {
        warn!(error = %e, "Initial sync failed");
    }

    let patchbay = Arc::new(Patchbay::new(runtime, config));
    spawn_reconciler(Arc::downgrade(&patchbay), events, config.server.settle())?;

    info!(target = %config.target.name, "Patchbay ready");
    Ok(patchbay)
}

/// Whether a PipeWire server is reachable.
///
/// Uses the shared connection if one exists, otherwise a throwaway one.
#[must_use]
pub fn has_pipewire() -> bool {
    let existing = INSTANCE.lock().clone();
    match existing {
        Some(patchbay) => patchbay.is_available(),
        None => PipeWireRuntime::probe_server(),
    }
}
