//! venmic PipeWire - the graph backend behind the patchbay.
//!
//! This crate handles all interactions with PipeWire, including:
//! - Connecting to the PipeWire daemon
//! - Creating the virtual microphone and links into it
//! - Monitoring the audio graph for changes
//! - Re-applying the active rule when the graph changes

pub mod error;
pub mod factory;
pub mod graph;
pub mod monitor;
pub mod patchbay;
pub mod reconcile;
pub mod runtime;

pub use error::{PwError, PwResult};
pub use graph::GraphStore;
pub use monitor::GraphEvent;
pub use patchbay::{PipeWirePatchbay, has_pipewire, instance, instance_with};
pub use runtime::PipeWireRuntime;
