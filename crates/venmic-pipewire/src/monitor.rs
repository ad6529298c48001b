//! PipeWire graph monitoring.
//!
//! Registry callbacks run on the PipeWire thread. They record globals into
//! the [`GraphStore`] and report what changed over a bounded channel. A full
//! channel drops the event: consumers always re-read the whole snapshot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use libspa::utils::dict::DictRef;
use pipewire::node::NodeChangeMask;
use pipewire::registry::{GlobalObject, RegistryRc};
use pipewire::types::ObjectType;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use venmic_core::node::collect_properties;
use venmic_core::{LinkInfo, NodeInfo, PortInfo, PropertyMap};

use crate::graph::{GraphStore, Removed};

/// Events emitted by the graph monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was added to the graph
    NodeAdded { id: u32 },
    /// A node's properties changed
    NodeChanged { id: u32 },
    /// A node was removed from the graph
    NodeRemoved { id: u32 },
    /// A port was added
    PortAdded { id: u32, node_id: u32 },
    /// A port was removed
    PortRemoved { id: u32, node_id: u32 },
    /// A link was created
    LinkAdded { id: u32 },
    /// A link was removed
    LinkRemoved { id: u32 },
}

impl GraphEvent {
    /// Whether this event can change which links should exist.
    ///
    /// New links never do: the ones venmic creates are confirmed by the
    /// request that created them.
    #[must_use]
    pub fn affects_routing(&self) -> bool {
        !matches!(self, Self::LinkAdded { .. })
    }
}

/// A bound node proxy. Dropping it stops property updates.
struct BoundNode {
    _proxy: pipewire::node::Node,
    _listener: pipewire::node::NodeListener,
}

/// Registry handlers, owned by the PipeWire thread.
pub(crate) struct Monitor {
    store: Arc<GraphStore>,
    events: mpsc::Sender<GraphEvent>,
    registry: RegistryRc,
    bound: RefCell<HashMap<u32, BoundNode>>,
}

impl Monitor {
    pub(crate) fn new(store: Arc<GraphStore>, events: mpsc::Sender<GraphEvent>, registry: RegistryRc) -> Self {
        Self { store, events, registry, bound: RefCell::new(HashMap::new()) }
    }

    pub(crate) fn handle_global(&self, global: &GlobalObject<&DictRef>) {
        let props = properties_of(global);

        match global.type_ {
            ObjectType::Node => {
                debug!(id = global.id, name = ?props.get("node.name"), class = ?props.get("media.class"), "Node added");

                self.store.insert_node(NodeInfo::new(global.id, props));
                self.bind_node(global);
                emit(&self.events, GraphEvent::NodeAdded { id: global.id });
            }

            ObjectType::Port => match PortInfo::from_properties(global.id, &props) {
                Some(port) => {
                    let node_id = port.node_id;
                    self.store.insert_port(port);
                    emit(&self.events, GraphEvent::PortAdded { id: global.id, node_id });
                }
                None => debug!(id = global.id, "Skipping port without node or direction"),
            },

            ObjectType::Link => match LinkInfo::from_properties(global.id, &props) {
                Some(link) => {
                    self.store.insert_link(link);
                    emit(&self.events, GraphEvent::LinkAdded { id: global.id });
                }
                None => debug!(id = global.id, "Skipping link with unparsable endpoints"),
            },

            _ => {}
        }
    }

    pub(crate) fn handle_global_remove(&self, id: u32) {
        let event = match self.store.remove_global(id) {
            Some(Removed::Node) => {
                self.bound.borrow_mut().remove(&id);
                GraphEvent::NodeRemoved { id }
            }
            Some(Removed::Port { node_id }) => GraphEvent::PortRemoved { id, node_id },
            Some(Removed::Link) => GraphEvent::LinkRemoved { id },
            None => return,
        };

        emit(&self.events, event);
    }

    /// Bind a proxy for a node so later `info` events refresh its properties.
    fn bind_node(&self, global: &GlobalObject<&DictRef>) {
        let id = global.id;
        let proxy: pipewire::node::Node = match self.registry.bind(global) {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!(id, error = %e, "Failed to bind node, properties will not be updated");
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let listener = proxy
            .add_listener_local()
            .info(move |info| {
                if !info.change_mask().contains(NodeChangeMask::PROPS) {
                    return;
                }
                let Some(props) = info.props() else {
                    return;
                };

                trace!(id, "Node info");
                let properties: PropertyMap = collect_properties(props.iter());
                if store.update_node_properties(id, properties) {
                    emit(&events, GraphEvent::NodeChanged { id });
                }
            })
            .register();

        self.bound.borrow_mut().insert(id, BoundNode { _proxy: proxy, _listener: listener });
    }
}

fn properties_of(global: &GlobalObject<&DictRef>) -> PropertyMap {
    global.props.as_ref().map(|p| collect_properties(p.iter())).unwrap_or_default()
}

fn emit(events: &mpsc::Sender<GraphEvent>, event: GraphEvent) {
    if let Err(mpsc::error::TrySendError::Full(event)) = events.try_send(event) {
        trace!(?event, "Event channel full, dropping event");
    }
}
