//! PipeWire runtime that combines monitoring and object creation.
//!
//! One dedicated thread owns the main loop, context, core and registry.
//! Everything else talks to it through [`FactoryRequest`]s and reads the
//! graph from the shared [`GraphStore`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::time::Duration;

use libspa::utils::result::AsyncSeq;
use parking_lot::Mutex;
use pipewire::context::ContextRc;
use pipewire::core::PW_ID_CORE;
use pipewire::main_loop::MainLoopRc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use venmic_core::config::TargetConfig;
use venmic_core::{Config, Error, GraphBackend, GraphSnapshot, LinkParams, LinkRemoval};

use crate::error::{PwError, PwResult};
use crate::factory::{self, FactoryRequest, FactoryResponse, Reply};
use crate::graph::GraphStore;
use crate::monitor::{GraphEvent, Monitor};

/// Capacity of the graph event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Upper bound for the liveness round trip.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// PipeWire runtime handle.
pub struct PipeWireRuntime {
    /// Channel to the PipeWire thread
    requests: Mutex<pipewire::channel::Sender<FactoryRequest>>,
    /// Graph store (written by the PipeWire thread)
    store: Arc<GraphStore>,
    /// Cleared when the PipeWire thread exits
    alive: Arc<AtomicBool>,
    /// Bound for every round trip
    timeout: Duration,
}

impl PipeWireRuntime {
    /// Spawn the PipeWire thread and wait until it is connected.
    ///
    /// Returns the handle and the receiving end of the graph event channel.
    pub fn spawn(config: &Config) -> PwResult<(Self, mpsc::Receiver<GraphEvent>)> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (request_tx, request_rx) = pipewire::channel::channel();
        let (started_tx, started_rx) = std_mpsc::channel();

        let store = Arc::new(GraphStore::new());
        let alive = Arc::new(AtomicBool::new(true));
        let timeout = config.server.timeout();

        let thread_store = Arc::clone(&store);
        let thread_alive = Arc::clone(&alive);
        let target = config.target.clone();

        std::thread::Builder::new()
            .name("pipewire-runtime".to_string())
            .spawn(move || {
                if let Err(e) = run_pipewire_thread(&target, thread_store, event_tx, request_rx, &started_tx) {
                    error!(error = %e, "PipeWire runtime failed");
                    let _ = started_tx.send(Err(e));
                }
                thread_alive.store(false, Ordering::Release);
                info!("PipeWire runtime exiting");
            })
            .map_err(|e| PwError::MainLoopError(format!("Failed to spawn PipeWire thread: {e}")))?;

        match started_rx.recv_timeout(timeout) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {
                let _ = request_tx.send(FactoryRequest::Shutdown);
                return Err(PwError::Timeout { operation: "connect", timeout });
            }
            Err(RecvTimeoutError::Disconnected) => return Err(PwError::Disconnected),
        }

        Ok((Self { requests: Mutex::new(request_tx), store, alive, timeout }, event_rx))
    }

    /// Whether a PipeWire server accepts connections.
    ///
    /// Uses a throwaway main loop and context, never fails.
    #[must_use]
    pub fn probe_server() -> bool {
        pipewire::init();

        let Ok(main_loop) = MainLoopRc::new(None) else {
            return false;
        };
        let Ok(context) = ContextRc::new(&main_loop, None) else {
            return false;
        };

        match context.connect_rc(None) {
            Ok(_core) => true,
            Err(e) => {
                debug!(error = %e, "PipeWire not reachable");
                false
            }
        }
    }

    /// Whether the PipeWire thread is still running its main loop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Round trip with the server, bounded by the configured timeout.
    pub fn sync(&self) -> PwResult<()> {
        self.sync_within(self.timeout)
    }

    fn sync_within(&self, timeout: Duration) -> PwResult<()> {
        match self.request("sync", timeout, |reply| FactoryRequest::Sync { reply })? {
            FactoryResponse::Synced => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    fn request(
        &self,
        operation: &'static str,
        timeout: Duration,
        make: impl FnOnce(Reply) -> FactoryRequest,
    ) -> PwResult<FactoryResponse> {
        if !self.is_running() {
            return Err(PwError::Disconnected);
        }

        let (reply, response) = std_mpsc::channel();
        self.requests.lock().send(make(reply)).map_err(|_| PwError::Disconnected)?;

        response.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PwError::Timeout { operation, timeout },
            RecvTimeoutError::Disconnected => PwError::Disconnected,
        })
    }

    /// Request shutdown of the PipeWire thread.
    pub fn shutdown(&self) {
        let _ = self.requests.lock().send(FactoryRequest::Shutdown);
    }
}

impl Drop for PipeWireRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl GraphBackend for PipeWireRuntime {
    fn refresh(&self) -> venmic_core::Result<Arc<GraphSnapshot>> {
        self.sync()?;
        Ok(self.store.snapshot())
    }

    fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.store.snapshot()
    }

    fn create_link(&self, params: LinkParams) -> venmic_core::Result<()> {
        match self.request("create link", self.timeout, |reply| FactoryRequest::CreateLink { params, reply })? {
            FactoryResponse::LinkRequested => Ok(()),
            FactoryResponse::Error(reason) => Err(Error::LinkCreationFailed { node: params.output_node, reason }),
            other => Err(unexpected(&other).into()),
        }
    }

    fn destroy_link(&self, id: u32) -> venmic_core::Result<LinkRemoval> {
        if !self.store.contains_link(id) {
            return Ok(LinkRemoval::AlreadyGone);
        }

        match self.request("destroy link", self.timeout, |reply| FactoryRequest::DestroyLink { id, reply })? {
            FactoryResponse::LinkDestroyRequested { .. } => {}
            FactoryResponse::Error(reason) => return Err(Error::LinkRemovalFailed { link: Some(id), reason }),
            other => return Err(unexpected(&other).into()),
        }

        self.sync()?;
        if self.store.contains_link(id) {
            return Err(Error::LinkRemovalFailed {
                link: Some(id),
                reason: "link still present after round trip".to_string(),
            });
        }
        Ok(LinkRemoval::Removed)
    }

    fn probe(&self) -> bool {
        self.is_running() && self.sync_within(PROBE_TIMEOUT.min(self.timeout)).is_ok()
    }
}

fn unexpected(response: &FactoryResponse) -> PwError {
    PwError::MainLoopError(format!("Unexpected response: {response:?}"))
}

/// Run the PipeWire thread: connect, report startup, then serve the loop.
fn run_pipewire_thread(
    target: &TargetConfig,
    store: Arc<GraphStore>,
    events: mpsc::Sender<GraphEvent>,
    requests: pipewire::channel::Receiver<FactoryRequest>,
    started: &std_mpsc::Sender<PwResult<()>>,
) -> PwResult<()> {
    pipewire::init();

    info!("PipeWire runtime starting...");

    let main_loop = MainLoopRc::new(None)
        .map_err(|e| PwError::MainLoopError(format!("Failed to create main loop: {e}")))?;

    let context = ContextRc::new(&main_loop, None)
        .map_err(|e| PwError::ConnectionFailed(format!("Failed to create context: {e}")))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| PwError::ConnectionFailed(format!("Failed to connect: {e}")))?;

    let registry = core
        .get_registry_rc()
        .map_err(|e| PwError::RegistryError(format!("Failed to get registry: {e}")))?;

    info!("Connected to PipeWire");

    let monitor = Rc::new(Monitor::new(store, events, registry.clone()));

    let _registry_listener = registry
        .add_listener_local()
        .global({
            let monitor = Rc::clone(&monitor);
            move |global| monitor.handle_global(global)
        })
        .global_remove({
            let monitor = Rc::clone(&monitor);
            move |id| monitor.handle_global_remove(id)
        })
        .register();

    // Sync requests waiting for their `done`
    let pending: Rc<RefCell<Vec<(AsyncSeq, Reply)>>> = Rc::new(RefCell::new(Vec::new()));

    let _core_listener = core
        .add_listener_local()
        .done({
            let pending = Rc::clone(&pending);
            move |id, seq| {
                if id != PW_ID_CORE {
                    return;
                }
                pending.borrow_mut().retain(|(expected, reply)| {
                    if *expected == seq {
                        let _ = reply.send(FactoryResponse::Synced);
                        false
                    } else {
                        true
                    }
                });
            }
        })
        .error({
            let main_loop = main_loop.clone();
            move |id, seq, res, message| {
                if id == PW_ID_CORE {
                    error!(seq, res, reason = %message, "PipeWire core error, stopping runtime");
                    main_loop.quit();
                } else {
                    warn!(id, seq, res, reason = %message, "PipeWire object error");
                }
            }
        })
        .register();

    // Kept alive for the lifetime of the loop; the node goes away with it
    let _virtual_mic = if target.create {
        Some(factory::create_virtual_mic(&core, target)?)
    } else {
        None
    };

    let _requests = requests.attach(main_loop.loop_(), {
        let core = core.clone();
        let registry = registry.clone();
        let main_loop = main_loop.clone();
        let pending = Rc::clone(&pending);

        move |request| match request {
            FactoryRequest::Sync { reply } => match core.sync(0) {
                Ok(seq) => pending.borrow_mut().push((seq, reply)),
                Err(e) => {
                    let _ = reply.send(FactoryResponse::Error(format!("Sync failed: {e}")));
                }
            },
            FactoryRequest::CreateLink { params, reply } => {
                let response = match factory::create_link(&core, params) {
                    Ok(()) => FactoryResponse::LinkRequested,
                    Err(e) => FactoryResponse::Error(e.to_string()),
                };
                let _ = reply.send(response);
            }
            FactoryRequest::DestroyLink { id, reply } => {
                factory::destroy_link(&registry, id);
                let _ = reply.send(FactoryResponse::LinkDestroyRequested { id });
            }
            FactoryRequest::Shutdown => {
                info!("Runtime received shutdown request");
                main_loop.quit();
            }
        }
    });

    let _ = started.send(Ok(()));

    info!("Starting PipeWire main loop");
    main_loop.run();

    Ok(())
}
