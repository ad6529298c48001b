//! Graph nodes, ports and their property maps.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// String-keyed node properties, sorted by key.
pub type PropertyMap = BTreeMap<String, String>;

/// Well-known PipeWire property keys.
pub mod keys {
    pub const NODE_NAME: &str = "node.name";
    pub const MEDIA_CLASS: &str = "media.class";
    pub const PORT_NAME: &str = "port.name";
    pub const PORT_DIRECTION: &str = "port.direction";
    pub const PORT_MONITOR: &str = "port.monitor";
    pub const PORT_NODE: &str = "node.id";
    pub const AUDIO_CHANNEL: &str = "audio.channel";
    pub const LINK_OUTPUT_NODE: &str = "link.output.node";
    pub const LINK_OUTPUT_PORT: &str = "link.output.port";
    pub const LINK_INPUT_NODE: &str = "link.input.node";
    pub const LINK_INPUT_PORT: &str = "link.input.port";
}

/// Build a property map from raw key/value pairs.
///
/// Entries with an empty key cannot be addressed by a rule and are dropped.
pub fn collect_properties<'a, I>(pairs: I) -> PropertyMap
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Information about a node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// PipeWire object ID
    pub id: u32,
    /// All node properties
    pub properties: PropertyMap,
}

impl NodeInfo {
    /// Create a node from its id and properties.
    #[must_use]
    pub fn new(id: u32, properties: PropertyMap) -> Self {
        Self { id, properties }
    }

    /// Look up a single property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Node name (`node.name`).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.property(keys::NODE_NAME)
    }

    /// Media class (`Stream/Output/Audio`, `Audio/Sink`, ...).
    #[must_use]
    pub fn media_class(&self) -> Option<&str> {
        self.property(keys::MEDIA_CLASS)
    }

    /// Properties restricted to `keys`, or all of them when `keys` is empty.
    #[must_use]
    pub fn select(&self, keys: &BTreeSet<String>) -> PropertyMap {
        if keys.is_empty() {
            return self.properties.clone();
        }

        self.properties
            .iter()
            .filter(|(k, _)| keys.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port (receives audio)
    Input,
    /// Output port (sends audio)
    Output,
}

impl PortDirection {
    /// Parse PipeWire's `port.direction` value.
    #[must_use]
    pub fn from_pw(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Self::Input),
            "out" => Some(Self::Output),
            _ => None,
        }
    }
}

/// Information about a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// PipeWire object ID
    pub id: u32,
    /// Parent node ID
    pub node_id: u32,
    /// Port name
    pub name: String,
    /// Port direction (in/out)
    pub direction: PortDirection,
    /// Audio channel position (FL, FR, MONO, ...)
    pub channel: Option<String>,
    /// Whether this is a sink monitor port
    pub is_monitor: bool,
}

impl PortInfo {
    /// Parse a port from its registry properties.
    ///
    /// Returns `None` when the owning node or the direction cannot be
    /// determined.
    #[must_use]
    pub fn from_properties(id: u32, props: &PropertyMap) -> Option<Self> {
        let node_id = props.get(keys::PORT_NODE)?.parse().ok()?;
        let name = props.get(keys::PORT_NAME).cloned().unwrap_or_default();

        let direction = match props.get(keys::PORT_DIRECTION) {
            Some(d) => PortDirection::from_pw(d)?,
            None if name.starts_with("input") || name.starts_with("playback") => {
                PortDirection::Input
            }
            None if name.starts_with("output")
                || name.starts_with("capture")
                || name.starts_with("monitor") =>
            {
                PortDirection::Output
            }
            None => return None,
        };

        Some(Self {
            id,
            node_id,
            name,
            direction,
            channel: props.get(keys::AUDIO_CHANNEL).cloned(),
            is_monitor: props.get(keys::PORT_MONITOR).is_some_and(|m| m == "true"),
        })
    }

    /// Whether this port carries a mono channel.
    #[must_use]
    pub fn is_mono(&self) -> bool {
        self.channel.as_deref() == Some("MONO")
    }
}
