//! Point-in-time view of the audio graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::link::{LinkInfo, PortPair};
use crate::node::{NodeInfo, PortDirection, PortInfo, PropertyMap};

/// Nodes, ports and links of the graph, ordered by object id.
///
/// A snapshot handed out by a backend is never mutated afterwards; the
/// mutating methods exist for the store that builds them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    nodes: BTreeMap<u32, NodeInfo>,
    ports: BTreeMap<u32, PortInfo>,
    links: BTreeMap<u32, LinkInfo>,
}

impl GraphSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a node.
    pub fn insert_node(&mut self, node: NodeInfo) {
        self.nodes.insert(node.id, node);
    }

    /// Replace the properties of a known node.
    ///
    /// Returns false if the node is unknown or its properties are unchanged.
    pub fn update_node_properties(&mut self, id: u32, properties: PropertyMap) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.properties != properties => {
                node.properties = properties;
                true
            }
            _ => false,
        }
    }

    /// Remove a node together with its ports and the links touching it.
    pub fn remove_node(&mut self, id: u32) -> Option<NodeInfo> {
        let node = self.nodes.remove(&id)?;
        self.ports.retain(|_, p| p.node_id != id);
        self.links.retain(|_, l| l.output_node != id && l.input_node != id);
        Some(node)
    }

    /// Add or replace a port.
    pub fn insert_port(&mut self, port: PortInfo) {
        self.ports.insert(port.id, port);
    }

    /// Remove a port and the links touching it.
    pub fn remove_port(&mut self, id: u32) -> Option<PortInfo> {
        let port = self.ports.remove(&id)?;
        self.links.retain(|_, l| l.output_port != id && l.input_port != id);
        Some(port)
    }

    /// Add or replace a link.
    pub fn insert_link(&mut self, link: LinkInfo) {
        self.links.insert(link.id, link);
    }

    /// Remove a link.
    pub fn remove_link(&mut self, id: u32) -> Option<LinkInfo> {
        self.links.remove(&id)
    }

    /// All nodes, ascending by id.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    /// Get a node by ID.
    #[must_use]
    pub fn node(&self, id: u32) -> Option<&NodeInfo> {
        self.nodes.get(&id)
    }

    /// Get a node by `node.name`.
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.values().find(|n| n.name() == Some(name))
    }

    #[must_use]
    pub fn contains_node(&self, id: u32) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a port by ID.
    #[must_use]
    pub fn port(&self, id: u32) -> Option<&PortInfo> {
        self.ports.get(&id)
    }

    /// Ports of `node_id` in `direction`, ascending by id.
    #[must_use]
    pub fn ports_of(&self, node_id: u32, direction: PortDirection) -> Vec<&PortInfo> {
        self.ports
            .values()
            .filter(|p| p.node_id == node_id && p.direction == direction)
            .collect()
    }

    /// All links, ascending by id.
    pub fn links(&self) -> impl Iterator<Item = &LinkInfo> {
        self.links.values()
    }

    /// Get a link by ID.
    #[must_use]
    pub fn link(&self, id: u32) -> Option<&LinkInfo> {
        self.links.get(&id)
    }

    /// Find the link connecting `ports`, if any.
    #[must_use]
    pub fn link_between(&self, ports: PortPair) -> Option<&LinkInfo> {
        self.links.values().find(|l| l.ports() == ports)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
