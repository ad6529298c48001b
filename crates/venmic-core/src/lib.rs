//! venmic core - stream matching and link management for the virtual microphone.
//!
//! This crate holds the graph model and the patchbay logic. It knows nothing
//! about PipeWire itself: the server is reached through [`GraphBackend`].

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod link;
pub mod manager;
pub mod node;
pub mod patchbay;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::GraphBackend;
pub use config::{Config, load_config, load_config_from};
pub use error::{Error, Result};
pub use filter::{FilterRule, TargetMode};
pub use link::{LinkInfo, LinkParams, LinkRemoval, LinkState, OwnedLink};
pub use manager::{LinkManager, LinkReport, Routing};
pub use node::{NodeInfo, PortDirection, PortInfo, PropertyMap};
pub use patchbay::Patchbay;
pub use snapshot::GraphSnapshot;
