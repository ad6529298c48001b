//! In-memory graph server for tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::backend::GraphBackend;
use crate::error::{Error, Result};
use crate::link::{LinkInfo, LinkParams, LinkRemoval};
use crate::node::{NodeInfo, PortDirection, PortInfo, collect_properties};
use crate::snapshot::GraphSnapshot;

/// `node.name` of the capture target in the default config.
pub const TARGET: &str = "venmic-capture";

/// Fake server: links requested through the backend show up in the next
/// refresh unless told otherwise.
///
/// Ports are numbered `node * 10 + index`.
pub struct FakeBackend {
    graph: Mutex<GraphSnapshot>,
    next_link: AtomicU32,
    creates: AtomicUsize,
    destroys: AtomicUsize,
    available: AtomicBool,
    rejected: Mutex<HashSet<u32>>,
    swallowed: Mutex<HashSet<u32>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(GraphSnapshot::new()),
            next_link: AtomicU32::new(1000),
            creates: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            rejected: Mutex::new(HashSet::new()),
            swallowed: Mutex::new(HashSet::new()),
        }
    }

    pub fn add_node(&self, id: u32, props: &[(&str, &str)]) {
        self.graph.lock().insert_node(NodeInfo::new(id, collect_properties(props.iter().copied())));
    }

    fn add_ports(&self, node: u32, direction: PortDirection, channels: &[&str]) {
        let mut graph = self.graph.lock();
        for (index, channel) in (0u32..).zip(channels) {
            graph.insert_port(PortInfo {
                id: node * 10 + index,
                node_id: node,
                name: format!("port_{channel}"),
                direction,
                channel: Some((*channel).to_string()),
                is_monitor: false,
            });
        }
    }

    /// Application playback stream with one output port per channel.
    pub fn add_stream(&self, id: u32, props: &[(&str, &str)], channels: &[&str]) {
        let mut all = vec![("media.class", "Stream/Output/Audio")];
        all.extend_from_slice(props);
        self.add_node(id, &all);
        self.add_ports(id, PortDirection::Output, channels);
    }

    /// Stereo virtual microphone named [`TARGET`].
    pub fn add_target(&self, id: u32) {
        self.add_node(id, &[("media.class", "Audio/Source/Virtual"), ("node.name", TARGET)]);
        self.add_ports(id, PortDirection::Input, &["FL", "FR"]);
    }

    pub fn remove_node(&self, id: u32) {
        self.graph.lock().remove_node(id);
    }

    pub fn set_property(&self, id: u32, key: &str, value: &str) {
        let mut graph = self.graph.lock();
        if let Some(node) = graph.node(id) {
            let mut props = node.properties.clone();
            props.insert(key.to_string(), value.to_string());
            graph.update_node_properties(id, props);
        }
    }

    /// Link two ports as some other client would.
    pub fn link_ports(&self, output_node: u32, output_port: u32, input_node: u32, input_port: u32) -> u32 {
        let id = self.next_link.fetch_add(1, Ordering::SeqCst);
        self.graph.lock().insert_link(LinkInfo { id, output_node, output_port, input_node, input_port });
        id
    }

    pub fn remove_link(&self, id: u32) {
        self.graph.lock().remove_link(id);
    }

    pub fn has_link(&self, id: u32) -> bool {
        self.graph.lock().link(id).is_some()
    }

    pub fn is_linked(&self, output_port: u32, input_port: u32) -> bool {
        self.graph.lock().link_between((output_port, input_port)).is_some()
    }

    pub fn link_count(&self) -> usize {
        self.graph.lock().links().count()
    }

    /// Refuse link requests from this output port.
    pub fn reject_output_port(&self, port: u32) {
        self.rejected.lock().insert(port);
    }

    /// Accept link requests from this output port but never create them.
    pub fn swallow_output_port(&self, port: u32) {
        self.swallowed.lock().insert(port);
    }

    pub fn accept_all(&self) {
        self.rejected.lock().clear();
        self.swallowed.lock().clear();
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Create and destroy requests received so far.
    pub fn mutations(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.destroys.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ServerUnavailable("fake server stopped".to_string()))
        }
    }
}

impl GraphBackend for FakeBackend {
    fn refresh(&self) -> Result<Arc<GraphSnapshot>> {
        self.check_available()?;
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::new(self.graph.lock().clone())
    }

    fn create_link(&self, params: LinkParams) -> Result<()> {
        self.check_available()?;
        self.creates.fetch_add(1, Ordering::SeqCst);

        if self.rejected.lock().contains(&params.output_port) {
            return Err(Error::LinkCreationFailed {
                node: params.output_node,
                reason: "incompatible format".to_string(),
            });
        }

        if !self.swallowed.lock().contains(&params.output_port) {
            self.link_ports(params.output_node, params.output_port, params.input_node, params.input_port);
        }
        Ok(())
    }

    fn destroy_link(&self, id: u32) -> Result<LinkRemoval> {
        self.check_available()?;
        self.destroys.fetch_add(1, Ordering::SeqCst);

        Ok(match self.graph.lock().remove_link(id) {
            Some(_) => LinkRemoval::Removed,
            None => LinkRemoval::AlreadyGone,
        })
    }

    fn probe(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
