//! Links between ports.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::node::{PropertyMap, keys};

/// A link as announced by the graph server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// PipeWire object ID
    pub id: u32,
    /// Output (source) node ID
    pub output_node: u32,
    /// Output port ID
    pub output_port: u32,
    /// Input (destination) node ID
    pub input_node: u32,
    /// Input port ID
    pub input_port: u32,
}

impl LinkInfo {
    /// Parse a link from its registry properties.
    #[must_use]
    pub fn from_properties(id: u32, props: &PropertyMap) -> Option<Self> {
        let get = |key: &str| props.get(key).and_then(|v| v.parse().ok());

        Some(Self {
            id,
            output_node: get(keys::LINK_OUTPUT_NODE)?,
            output_port: get(keys::LINK_OUTPUT_PORT)?,
            input_node: get(keys::LINK_INPUT_NODE)?,
            input_port: get(keys::LINK_INPUT_PORT)?,
        })
    }

    /// The `(output port, input port)` pair this link connects.
    #[must_use]
    pub fn ports(&self) -> PortPair {
        (self.output_port, self.input_port)
    }
}

/// `(output port, input port)`.
pub type PortPair = (u32, u32);

/// Parameters for creating a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    /// Output node ID
    pub output_node: u32,
    /// Output port ID
    pub output_port: u32,
    /// Input node ID
    pub input_node: u32,
    /// Input port ID
    pub input_port: u32,
}

impl LinkParams {
    /// Create link parameters.
    #[must_use]
    pub fn new(output_node: u32, output_port: u32, input_node: u32, input_port: u32) -> Self {
        Self { output_node, output_port, input_node, input_port }
    }

    #[must_use]
    pub fn ports(&self) -> PortPair {
        (self.output_port, self.input_port)
    }
}

/// Outcome of a link removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRemoval {
    /// The server destroyed the link
    Removed,
    /// The link no longer existed
    AlreadyGone,
}

/// Lifecycle of a link owned by the link manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    /// Creation requested, not yet seen in the graph
    Pending,
    /// Confirmed by the server
    Active,
    /// Source node disappeared, removal pending
    Orphaned,
    /// Terminal
    Removed,
}

/// A link created and owned by the link manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedLink {
    /// Server object ID, known once the link is confirmed
    pub id: Option<u32>,
    /// Matched source node
    pub source_node: u32,
    /// Output port on the source node
    pub output_port: u32,
    /// Capture target node
    pub target_node: u32,
    /// Input port on the capture target
    pub target_port: u32,
    /// Current lifecycle state
    pub state: LinkState,
    /// When creation was requested
    pub created_at: SystemTime,
}

impl OwnedLink {
    /// A freshly requested link.
    #[must_use]
    pub fn pending(params: LinkParams) -> Self {
        Self {
            id: None,
            source_node: params.output_node,
            output_port: params.output_port,
            target_node: params.input_node,
            target_port: params.input_port,
            state: LinkState::Pending,
            created_at: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn ports(&self) -> PortPair {
        (self.output_port, self.target_port)
    }

    /// Mark the link confirmed under server id `id`.
    pub fn activate(&mut self, id: u32) {
        self.id = Some(id);
        self.state = LinkState::Active;
    }
}
