//! The seam between the link manager and a graph server.

use std::sync::Arc;

use crate::error::Result;
use crate::link::{LinkParams, LinkRemoval};
use crate::snapshot::GraphSnapshot;

/// Operations the patchbay needs from a graph server.
///
/// Every call is synchronous from the caller's side and bounded in time by
/// the implementation.
#[cfg_attr(test, mockall::automock)]
pub trait GraphBackend {
    /// Wait until every event the server emitted so far has been applied,
    /// then return the resulting snapshot.
    fn refresh(&self) -> Result<Arc<GraphSnapshot>>;

    /// Last known snapshot, without talking to the server.
    fn snapshot(&self) -> Arc<GraphSnapshot>;

    /// Ask the server to create a link. Confirmation shows up in a later
    /// snapshot.
    fn create_link(&self, params: LinkParams) -> Result<()>;

    /// Ask the server to destroy link `id`.
    fn destroy_link(&self, id: u32) -> Result<LinkRemoval>;

    /// Cheap liveness check. Never fails.
    fn probe(&self) -> bool;
}
