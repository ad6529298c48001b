//! Live graph store fed by the registry monitor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tracing::debug;

use venmic_core::{GraphSnapshot, LinkInfo, NodeInfo, PortInfo, PropertyMap};

/// What kind of object a removed global id referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    Node,
    Port { node_id: u32 },
    Link,
}

/// Cached view of the PipeWire graph.
///
/// Written only by the PipeWire thread. Readers get immutable snapshots that
/// are rebuilt on demand after the graph changed.
pub struct GraphStore {
    graph: RwLock<GraphSnapshot>,
    /// Bumped on every mutation, under the write lock
    generation: AtomicU64,
    published: ArcSwap<GraphSnapshot>,
    published_generation: AtomicU64,
}

impl GraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(GraphSnapshot::new()),
            generation: AtomicU64::new(0),
            published: ArcSwap::from_pointee(GraphSnapshot::new()),
            published_generation: AtomicU64::new(0),
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut GraphSnapshot) -> R) -> R {
        let mut graph = self.graph.write();
        let result = f(&mut graph);
        self.generation.fetch_add(1, Ordering::Release);
        result
    }

    /// Add or replace a node.
    pub fn insert_node(&self, node: NodeInfo) {
        debug!(id = node.id, name = ?node.name(), "Node added to graph");
        self.mutate(|g| g.insert_node(node));
    }

    /// Replace a node's properties. Returns false if the node is unknown or
    /// nothing changed, leaving the published snapshot in place.
    pub fn update_node_properties(&self, id: u32, properties: PropertyMap) -> bool {
        let mut graph = self.graph.write();
        let changed = graph.update_node_properties(id, properties);
        if changed {
            self.generation.fetch_add(1, Ordering::Release);
        }
        changed
    }

    /// Add or replace a port.
    pub fn insert_port(&self, port: PortInfo) {
        debug!(id = port.id, node_id = port.node_id, name = %port.name, "Port added");
        self.mutate(|g| g.insert_port(port));
    }

    /// Add or replace a link.
    pub fn insert_link(&self, link: LinkInfo) {
        debug!(id = link.id, output = link.output_port, input = link.input_port, "Link added to graph");
        self.mutate(|g| g.insert_link(link));
    }

    /// Drop whatever object `id` refers to.
    pub fn remove_global(&self, id: u32) -> Option<Removed> {
        let mut graph = self.graph.write();

        let removed = if graph.remove_node(id).is_some() {
            Removed::Node
        } else if let Some(port) = graph.remove_port(id) {
            Removed::Port { node_id: port.node_id }
        } else if graph.remove_link(id).is_some() {
            Removed::Link
        } else {
            return None;
        };

        self.generation.fetch_add(1, Ordering::Release);
        debug!(id, kind = ?removed, "Global removed from graph");
        Some(removed)
    }

    /// Whether link `id` is currently in the graph.
    #[must_use]
    pub fn contains_link(&self, id: u32) -> bool {
        self.graph.read().link(id).is_some()
    }

    /// Immutable view of the current graph.
    ///
    /// Repeated calls on an unchanged graph return the same `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        if self.published_generation.load(Ordering::Acquire) == self.generation.load(Ordering::Acquire) {
            return self.published.load_full();
        }

        let graph = self.graph.read();
        let generation = self.generation.load(Ordering::Acquire);
        let snapshot = Arc::new(graph.clone());
        self.published.store(Arc::clone(&snapshot));
        self.published_generation.store(generation, Ordering::Release);
        snapshot
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
