//! Requests handled on the PipeWire thread and the objects they create.
//!
//! PipeWire objects must be created on the thread that runs the main loop,
//! so callers send a [`FactoryRequest`] and wait on its reply channel.

use std::sync::mpsc as std_mpsc;

use pipewire::core::CoreRc;
use pipewire::properties::properties;
use pipewire::registry::RegistryRc;
use tracing::{debug, info};

use venmic_core::LinkParams;
use venmic_core::config::TargetConfig;

use crate::error::{PwError, PwResult};

/// Reply channel carried by each request.
pub type Reply = std_mpsc::Sender<FactoryResponse>;

/// Request for the PipeWire thread.
#[derive(Debug)]
pub enum FactoryRequest {
    /// Round trip with the server; answered once every earlier event has
    /// been processed
    Sync { reply: Reply },
    /// Create a link between two ports
    CreateLink { params: LinkParams, reply: Reply },
    /// Destroy a link by ID
    DestroyLink { id: u32, reply: Reply },
    /// Quit the main loop
    Shutdown,
}

/// Response from factory operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryResponse {
    /// The server answered the round trip
    Synced,
    /// Link creation was sent to the server
    LinkRequested,
    /// Link destruction was sent to the server
    LinkDestroyRequested { id: u32 },
    /// Operation failed
    Error(String),
}

/// Create the virtual microphone streams are linked into.
///
/// The returned proxy owns the node: dropping it removes the node.
pub(crate) fn create_virtual_mic(core: &CoreRc, target: &TargetConfig) -> PwResult<pipewire::node::Node> {
    info!(name = %target.name, "Creating virtual microphone");

    let node_props = properties! {
        "factory.name" => "support.null-audio-sink",
        "node.name" => target.name.as_str(),
        "node.description" => target.description.as_str(),
        "media.class" => "Audio/Source/Virtual",
        "audio.channels" => "2",
        "audio.position" => "FL,FR",
        "venmic.managed" => "true",
        "session.suspend-timeout-seconds" => "0",
    };

    let proxy = core
        .create_object::<pipewire::node::Node>("adapter", &node_props)
        .map_err(|e| PwError::NodeCreationFailed(format!("Failed to create node: {e}")))?;

    debug!(name = %target.name, "Virtual microphone requested");
    Ok(proxy)
}

/// Ask the server to link two ports.
///
/// The link lingers after its proxy is dropped, so it stays until destroyed
/// through the registry.
pub(crate) fn create_link(core: &CoreRc, params: LinkParams) -> PwResult<()> {
    debug!(
        output_node = params.output_node,
        output_port = params.output_port,
        input_node = params.input_node,
        input_port = params.input_port,
        "Creating link"
    );

    let link_props = properties! {
        *pipewire::keys::LINK_OUTPUT_NODE => params.output_node.to_string(),
        *pipewire::keys::LINK_OUTPUT_PORT => params.output_port.to_string(),
        *pipewire::keys::LINK_INPUT_NODE => params.input_node.to_string(),
        *pipewire::keys::LINK_INPUT_PORT => params.input_port.to_string(),
        *pipewire::keys::OBJECT_LINGER => "true",
    };

    core.create_object::<pipewire::link::Link>("link-factory", &link_props)
        .map(drop)
        .map_err(|e| PwError::LinkCreationFailed(format!("Failed to create link: {e}")))
}

/// Ask the server to destroy link `id`.
pub(crate) fn destroy_link(registry: &RegistryRc, id: u32) {
    debug!(id, "Destroying link");
    // The server reports failures on the core error event.
    let _ = registry.destroy_global(id);
}
