//! Link manager: keeps the owned links in line with the active rule.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::backend::GraphBackend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::FilterRule;
use crate::link::{LinkParams, LinkRemoval, LinkState, OwnedLink, PortPair};
use crate::node::{NodeInfo, PortDirection, PortInfo};
use crate::snapshot::GraphSnapshot;

/// Which nodes take part in routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    /// `node.name` of the capture target
    pub target_name: String,
    /// `media.class` of routable streams
    pub stream_class: String,
}

impl From<&Config> for Routing {
    fn from(config: &Config) -> Self {
        Self {
            target_name: config.target.name.clone(),
            stream_class: config.filter.stream_class.clone(),
        }
    }
}

/// Outcome of a batch of link operations.
///
/// Failures of single links are collected here instead of aborting the
/// batch.
#[derive(Debug, Default)]
pub struct LinkReport {
    /// Links created and confirmed by the server
    pub created: usize,
    /// Owned links that are gone now
    pub removed: usize,
    /// Per-link failures
    pub failures: Vec<Error>,
    /// The capture target was not in the graph
    pub target_missing: bool,
}

impl LinkReport {
    /// Whether every requested operation succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the batch changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: LinkReport) {
        self.created += other.created;
        self.removed += other.removed;
        self.failures.extend(other.failures);
        self.target_missing |= other.target_missing;
    }
}

/// Creates and destroys links from matched streams into the capture target.
///
/// Owned links are keyed by the port pair they connect.
#[derive(Debug)]
pub struct LinkManager {
    routing: Routing,
    owned: BTreeMap<PortPair, OwnedLink>,
}

impl LinkManager {
    /// Create a link manager owning no links.
    #[must_use]
    pub fn new(routing: Routing) -> Self {
        Self { routing, owned: BTreeMap::new() }
    }

    #[must_use]
    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    /// Links currently owned, ordered by port pair.
    pub fn owned(&self) -> impl Iterator<Item = &OwnedLink> {
        self.owned.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owned.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Routable stream nodes, excluding the capture target itself.
    pub fn stream_nodes<'a>(
        &'a self,
        snapshot: &'a GraphSnapshot,
    ) -> impl Iterator<Item = &'a NodeInfo> + 'a {
        snapshot.nodes().filter(move |n| {
            n.media_class() == Some(self.routing.stream_class.as_str())
                && n.name() != Some(self.routing.target_name.as_str())
        })
    }

    /// Stream nodes matching `rule`.
    pub fn candidates<'a>(
        &'a self,
        snapshot: &'a GraphSnapshot,
        rule: &'a FilterRule,
    ) -> impl Iterator<Item = &'a NodeInfo> + 'a {
        self.stream_nodes(snapshot).filter(move |n| rule.matches(n))
    }

    /// Bring the owned links in line with `rule` and the current graph.
    ///
    /// Calling this twice on an unchanged graph issues no create or destroy
    /// request the second time.
    pub fn apply<B: GraphBackend + ?Sized>(
        &mut self,
        backend: &B,
        rule: &FilterRule,
    ) -> Result<LinkReport> {
        rule.validate()?;

        let snapshot = backend.refresh()?;
        let mut report = LinkReport::default();

        self.sweep(&snapshot, backend, &mut report);

        let desired = match snapshot.node_by_name(&self.routing.target_name) {
            Some(target) => self.desired(&snapshot, rule, target),
            None => {
                debug!(target = %self.routing.target_name, "Capture target not in graph");
                report.target_missing = true;
                BTreeMap::new()
            }
        };

        let stale: Vec<PortPair> =
            self.owned.keys().filter(|ports| !desired.contains_key(*ports)).copied().collect();
        for ports in stale {
            self.remove(ports, &snapshot, backend, &mut report);
        }

        let mut requested = Vec::new();
        for (ports, params) in desired {
            if self.owned.contains_key(&ports) {
                continue;
            }

            if let Some(existing) = snapshot.link_between(ports) {
                debug!(link = existing.id, ?ports, "Ports already linked by another client");
                continue;
            }

            match backend.create_link(params) {
                Ok(()) => {
                    debug!(node = params.output_node, ?ports, "Link requested");
                    self.owned.insert(ports, OwnedLink::pending(params));
                    requested.push(ports);
                }
                Err(e) => {
                    warn!(node = params.output_node, error = %e, "Failed to request link");
                    report.failures.push(e);
                }
            }
        }

        if !requested.is_empty() {
            match backend.refresh() {
                Ok(snapshot) => self.sweep(&snapshot, backend, &mut report),
                Err(e) => {
                    warn!(error = %e, "Could not confirm requested links");
                    report.failures.push(e);
                }
            }

            report.created = requested
                .iter()
                .filter(|ports| {
                    self.owned.get(*ports).is_some_and(|l| l.state == LinkState::Active)
                })
                .count();
        }

        if !report.is_noop() {
            info!(
                rule = %rule,
                created = report.created,
                removed = report.removed,
                failed = report.failures.len(),
                owned = self.owned.len(),
                "Links updated"
            );
        }

        Ok(report)
    }

    /// Remove every owned link.
    ///
    /// Links the server already dropped count as removed. Links that fail
    /// to be destroyed are reported and forgotten anyway.
    pub fn teardown<B: GraphBackend + ?Sized>(&mut self, backend: &B) -> LinkReport {
        let mut report = LinkReport::default();
        if self.owned.is_empty() {
            return report;
        }

        // Pending links have no id yet, look them up in a fresh graph
        let lookup = if self.owned.values().any(|l| l.id.is_none()) {
            match backend.refresh() {
                Ok(snapshot) => Some(Ok(snapshot)),
                Err(e) => {
                    warn!(error = %e, "Refresh failed, resolving pending links from last known graph");
                    Some(Err((backend.snapshot(), e.to_string())))
                }
            }
        } else {
            None
        };

        for (ports, link) in std::mem::take(&mut self.owned) {
            let id = match (link.id, &lookup) {
                (Some(id), _) => id,
                (None, Some(Ok(snapshot))) => match snapshot.link_between(ports) {
                    Some(found) => found.id,
                    None => {
                        debug!(?ports, "Pending link never reached the graph");
                        report.removed += 1;
                        continue;
                    }
                },
                (None, Some(Err((cached, reason)))) => match cached.link_between(ports) {
                    Some(found) => found.id,
                    None => {
                        warn!(?ports, reason = %reason, "Cannot resolve pending link");
                        report.failures.push(Error::LinkRemovalFailed {
                            link: None,
                            reason: format!("link {} -> {} unresolved: {reason}", ports.0, ports.1),
                        });
                        continue;
                    }
                },
                (None, None) => continue,
            };

            match backend.destroy_link(id) {
                Ok(LinkRemoval::Removed) => report.removed += 1,
                Ok(LinkRemoval::AlreadyGone) => {
                    debug!(link = id, "Link already gone");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(link = id, error = %e, "Failed to remove link");
                    report.failures.push(Error::LinkRemovalFailed { link: Some(id), reason: e.to_string() });
                }
            }
        }

        info!(removed = report.removed, failed = report.failures.len(), "Links torn down");
        report
    }

    /// Reconcile owned links with what the server reports.
    fn sweep<B: GraphBackend + ?Sized>(
        &mut self,
        snapshot: &GraphSnapshot,
        backend: &B,
        report: &mut LinkReport,
    ) {
        self.owned.retain(|ports, link| {
            if !snapshot.contains_node(link.source_node) {
                link.state = LinkState::Orphaned;
                info!(node = link.source_node, ?ports, "Source node disappeared");

                let id = link.id.or_else(|| snapshot.link_between(*ports).map(|l| l.id));
                match id.filter(|id| snapshot.link(*id).is_some()).map(|id| (id, backend.destroy_link(id))) {
                    Some((id, Err(e))) => {
                        warn!(link = id, error = %e, "Failed to remove orphaned link");
                        report.failures.push(Error::LinkRemovalFailed { link: Some(id), reason: e.to_string() });
                    }
                    Some((_, Ok(_))) | None => report.removed += 1,
                }

                link.state = LinkState::Removed;
                return false;
            }

            match link.state {
                LinkState::Pending => match snapshot.link_between(*ports) {
                    Some(found) => {
                        link.activate(found.id);
                        true
                    }
                    None => {
                        warn!(node = link.source_node, ?ports, "Link was not confirmed");
                        report.failures.push(Error::LinkCreationFailed {
                            node: link.source_node,
                            reason: format!(
                                "server did not confirm link {} -> {}",
                                ports.0, ports.1
                            ),
                        });
                        false
                    }
                },
                LinkState::Active => {
                    let present = link.id.is_some_and(|id| snapshot.link(id).is_some());
                    if !present {
                        info!(link = ?link.id, ?ports, "Link removed outside of venmic");
                        link.state = LinkState::Removed;
                    }
                    present
                }
                LinkState::Orphaned | LinkState::Removed => false,
            }
        });
    }

    /// Port pairs that should be linked for `rule`.
    fn desired(
        &self,
        snapshot: &GraphSnapshot,
        rule: &FilterRule,
        target: &NodeInfo,
    ) -> BTreeMap<PortPair, LinkParams> {
        let inputs: Vec<&PortInfo> = snapshot
            .ports_of(target.id, PortDirection::Input)
            .into_iter()
            .filter(|p| !p.is_monitor)
            .collect();

        let mut desired = BTreeMap::new();
        for node in self.candidates(snapshot, rule).filter(|n| n.id != target.id) {
            let outputs: Vec<&PortInfo> = snapshot
                .ports_of(node.id, PortDirection::Output)
                .into_iter()
                .filter(|p| !p.is_monitor)
                .collect();

            for ports in pair_ports(&outputs, &inputs) {
                desired.insert(ports, LinkParams::new(node.id, ports.0, target.id, ports.1));
            }
        }

        desired
    }

    /// Destroy one owned link. Kept on failure so a later pass retries.
    fn remove<B: GraphBackend + ?Sized>(
        &mut self,
        ports: PortPair,
        snapshot: &GraphSnapshot,
        backend: &B,
        report: &mut LinkReport,
    ) {
        let Some(link) = self.owned.get_mut(&ports) else {
            return;
        };

        let Some(id) = link.id.or_else(|| snapshot.link_between(ports).map(|l| l.id)) else {
            // Not in a graph fetched after the request, nothing to destroy
            debug!(?ports, "Pending link never reached the graph");
            self.owned.remove(&ports);
            return;
        };

        match backend.destroy_link(id) {
            Ok(outcome) => {
                debug!(link = id, ?outcome, "Link no longer wanted");
                link.state = LinkState::Removed;
                self.owned.remove(&ports);
                report.removed += 1;
            }
            Err(e) => {
                warn!(link = id, error = %e, "Failed to remove link");
                report.failures.push(Error::LinkRemovalFailed { link: Some(id), reason: e.to_string() });
            }
        }
    }
}

/// Pair a source's output ports with the target's input ports.
///
/// Single-port and `MONO` sources fan out to every input. Other ports go to
/// the input with the same channel, falling back to position.
#[must_use]
pub fn pair_ports(outputs: &[&PortInfo], inputs: &[&PortInfo]) -> Vec<PortPair> {
    if inputs.is_empty() {
        return Vec::new();
    }

    let fan_out = outputs.len() == 1;
    let mut pairs = Vec::new();

    for (index, output) in outputs.iter().enumerate() {
        if fan_out || output.is_mono() {
            pairs.extend(inputs.iter().map(|input| (output.id, input.id)));
            continue;
        }

        let input = inputs
            .iter()
            .find(|input| input.channel.is_some() && input.channel == output.channel)
            .unwrap_or(&inputs[index % inputs.len()]);
        pairs.push((output.id, input.id));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::backend::MockGraphBackend;
    use crate::filter::TargetMode;
    use crate::testing::{FakeBackend, TARGET};

    fn manager() -> LinkManager {
        LinkManager::new(Routing::from(&Config::default()))
    }

    fn include(key: &str, value: &str) -> FilterRule {
        FilterRule::new(key, value, TargetMode::Include)
    }

    fn exclude(key: &str, value: &str) -> FilterRule {
        FilterRule::new(key, value, TargetMode::Exclude)
    }

    fn backend() -> FakeBackend {
        let backend = FakeBackend::new();
        backend.add_target(2);
        backend.add_stream(10, &[("application.name", "Firefox")], &["FL", "FR"]);
        backend.add_stream(11, &[("application.name", "Discord")], &["FL", "FR"]);
        backend.add_stream(12, &[("media.role", "game")], &["MONO"]);
        backend
    }

    #[test]
    fn test_include_links_matching_stream_channel_by_channel() {
        let backend = backend();
        let mut links = manager();

        let report = links.apply(&backend, &include("application.name", "Firefox")).unwrap();

        assert_eq!(report.created, 2);
        assert!(report.is_clean());
        assert!(links.owned().all(|l| l.source_node == 10 && l.state == LinkState::Active));
        assert!(backend.is_linked(100, 20));
        assert!(backend.is_linked(101, 21));
        assert!(!backend.is_linked(100, 21));
    }

    #[test]
    fn test_exclude_links_everything_else() {
        let backend = backend();
        let mut links = manager();

        let report = links.apply(&backend, &exclude("application.name", "Discord")).unwrap();

        // Firefox FL/FR plus the mono game stream fanned out to both inputs
        assert_eq!(report.created, 4);
        let sources: Vec<_> = links.owned().map(|l| l.source_node).collect();
        assert!(sources.contains(&10));
        assert!(sources.contains(&12));
        assert!(!sources.contains(&11));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let backend = backend();
        let mut links = manager();
        let rule = exclude("application.name", "Discord");

        links.apply(&backend, &rule).unwrap();
        let owned: Vec<_> = links.owned().cloned().collect();
        let mutations = backend.mutations();

        let report = links.apply(&backend, &rule).unwrap();

        assert!(report.is_noop());
        assert_eq!(backend.mutations(), mutations);
        assert_eq!(links.owned().cloned().collect::<Vec<_>>(), owned);
    }

    #[test]
    fn test_target_and_foreign_classes_are_never_candidates() {
        let backend = backend();
        backend.add_node(13, &[("media.class", "Audio/Sink"), ("node.name", "speakers")]);
        let mut links = manager();

        links.apply(&backend, &exclude("application.name", "nobody")).unwrap();

        assert!(links.owned().all(|l| l.source_node != 13 && l.source_node != 2));
    }

    #[test]
    fn test_new_matching_node_is_linked_on_next_apply() {
        let backend = backend();
        let mut links = manager();
        let rule = include("application.name", "Firefox");
        links.apply(&backend, &rule).unwrap();

        backend.add_stream(14, &[("application.name", "Firefox")], &["FL", "FR"]);
        let report = links.apply(&backend, &rule).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(links.len(), 4);
    }

    #[test]
    fn test_property_change_reclassifies_node() {
        let backend = backend();
        let mut links = manager();
        let rule = include("application.name", "Firefox");
        links.apply(&backend, &rule).unwrap();

        backend.set_property(10, "application.name", "Chromium");
        let report = links.apply(&backend, &rule).unwrap();

        assert_eq!(report.removed, 2);
        assert!(links.is_empty());
        assert!(!backend.is_linked(100, 20));
    }

    #[test]
    fn test_vanished_node_orphans_its_links() {
        let backend = backend();
        let mut links = manager();
        let rule = include("application.name", "Firefox");
        links.apply(&backend, &rule).unwrap();

        backend.remove_node(10);
        let report = links.apply(&backend, &rule).unwrap();

        assert_eq!(report.removed, 2);
        assert!(links.is_empty());
    }

    #[test]
    fn test_externally_removed_link_is_recreated() {
        let backend = backend();
        let mut links = manager();
        let rule = include("application.name", "Firefox");
        links.apply(&backend, &rule).unwrap();

        let id = links.owned().next().and_then(|l| l.id).unwrap();
        backend.remove_link(id);
        let report = links.apply(&backend, &rule).unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(links.len(), 2);
        assert!(links.owned().all(|l| l.id != Some(id)));
    }

    #[test]
    fn test_rejected_link_does_not_abort_batch() {
        let backend = backend();
        backend.reject_output_port(100);
        let mut links = manager();

        let report = links.apply(&backend, &exclude("application.name", "Discord")).unwrap();

        assert_eq!(report.created, 3);
        assert_eq!(report.failures.len(), 1);
        assert_matches!(report.failures[0], Error::LinkCreationFailed { node: 10, .. });
        assert!(backend.is_linked(101, 21));
    }

    #[test]
    fn test_unconfirmed_link_is_reported_and_retried() {
        let backend = backend();
        backend.swallow_output_port(101);
        let mut links = manager();
        let rule = include("application.name", "Firefox");

        let report = links.apply(&backend, &rule).unwrap();
        assert_eq!(report.created, 1);
        assert_matches!(report.failures.as_slice(), [Error::LinkCreationFailed { node: 10, .. }]);
        assert_eq!(links.len(), 1);

        backend.accept_all();
        let report = links.apply(&backend, &rule).unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_foreign_link_is_left_alone() {
        let backend = backend();
        let foreign = backend.link_ports(10, 100, 2, 20);
        let mut links = manager();

        links.apply(&backend, &include("application.name", "Firefox")).unwrap();

        assert_eq!(links.len(), 1);
        links.teardown(&backend);
        assert!(backend.has_link(foreign));
    }

    #[test]
    fn test_teardown_removes_everything_owned() {
        let backend = backend();
        let mut links = manager();
        links.apply(&backend, &exclude("application.name", "Discord")).unwrap();

        let report = links.teardown(&backend);

        assert_eq!(report.removed, 4);
        assert!(report.is_clean());
        assert!(links.is_empty());
        assert_eq!(backend.link_count(), 0);
    }

    #[test]
    fn test_teardown_tolerates_already_removed_links() {
        let backend = backend();
        let mut links = manager();
        links.apply(&backend, &include("application.name", "Firefox")).unwrap();

        let id = links.owned().next().and_then(|l| l.id).unwrap();
        backend.remove_link(id);
        let report = links.teardown(&backend);

        assert_eq!(report.removed, 2);
        assert!(report.is_clean());
        assert!(links.is_empty());
    }

    #[test]
    fn test_teardown_when_server_gone_still_forgets_links() {
        let backend = backend();
        let mut links = manager();
        links.apply(&backend, &include("application.name", "Firefox")).unwrap();

        backend.set_available(false);
        let report = links.teardown(&backend);

        assert_eq!(report.failures.len(), 2);
        assert_matches!(report.failures[0], Error::LinkRemovalFailed { .. });
        assert!(links.is_empty());
    }

    fn timeout() -> Error {
        Error::ServerTimeout { operation: "sync", timeout: Duration::from_millis(5) }
    }

    /// Mock whose refreshes answer from `answers` in order, timing out once
    /// they run out.
    fn scripted(answers: Vec<Option<Arc<GraphSnapshot>>>, cached: Arc<GraphSnapshot>) -> MockGraphBackend {
        let calls = AtomicUsize::new(0);
        let mut mock = MockGraphBackend::new();
        mock.expect_refresh().returning(move || {
            match answers.get(calls.fetch_add(1, Ordering::SeqCst)).cloned().flatten() {
                Some(snapshot) => Ok(snapshot),
                None => Err(timeout()),
            }
        });
        mock.expect_snapshot().returning(move || Arc::clone(&cached));
        mock.expect_create_link().returning(|_| Ok(()));
        mock
    }

    #[test]
    fn test_teardown_reports_unresolvable_pending_links() {
        let initial = backend().snapshot();
        let mut mock = scripted(vec![Some(Arc::clone(&initial))], Arc::clone(&initial));
        mock.expect_destroy_link().never();
        let mut links = manager();

        let report = links.apply(&mock, &include("application.name", "Firefox")).unwrap();
        assert_eq!(report.created, 0);
        assert_matches!(report.failures.as_slice(), [Error::ServerTimeout { .. }]);
        assert!(links.owned().all(|l| l.state == LinkState::Pending));

        let report = links.teardown(&mock);

        assert_eq!(report.removed, 0);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|e| matches!(e, Error::LinkRemovalFailed { link: None, .. })));
        assert!(links.is_empty());
    }

    #[test]
    fn test_teardown_resolves_pending_links_with_fresh_graph() {
        let fake = backend();
        let initial = fake.snapshot();
        fake.link_ports(10, 100, 2, 20);
        fake.link_ports(10, 101, 2, 21);
        let linked = fake.snapshot();

        let mut mock = scripted(vec![Some(Arc::clone(&initial)), None, Some(linked)], initial);
        mock.expect_destroy_link().times(2).returning(|_| Ok(LinkRemoval::Removed));
        let mut links = manager();

        links.apply(&mock, &include("application.name", "Firefox")).unwrap();
        let report = links.teardown(&mock);

        assert_eq!(report.removed, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_failed_orphan_removal_is_reported() {
        let fake = backend();
        let mut links = manager();
        let rule = include("application.name", "Firefox");
        links.apply(&fake, &rule).unwrap();

        // Node 10 is gone but the server still lists its links
        let orphaned = FakeBackend::new();
        orphaned.add_target(2);
        orphaned.link_ports(10, 100, 2, 20);
        orphaned.link_ports(10, 101, 2, 21);
        let snapshot = orphaned.snapshot();

        let mut mock = MockGraphBackend::new();
        let fresh = Arc::clone(&snapshot);
        mock.expect_refresh().returning(move || Ok(Arc::clone(&fresh)));
        mock.expect_snapshot().returning(move || Arc::clone(&snapshot));
        mock.expect_create_link().never();
        mock.expect_destroy_link()
            .times(2)
            .returning(|_| Err(Error::ServerUnavailable("connection lost".to_string())));

        let report = links.apply(&mock, &rule).unwrap();

        assert_eq!(report.removed, 0);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|e| matches!(e, Error::LinkRemovalFailed { link: Some(_), .. })));
        assert!(links.is_empty());
    }

    #[test]
    fn test_missing_target_links_nothing() {
        let backend = FakeBackend::new();
        backend.add_stream(10, &[("application.name", "Firefox")], &["FL", "FR"]);
        let mut links = manager();

        let report = links.apply(&backend, &include("application.name", "Firefox")).unwrap();

        assert!(report.target_missing);
        assert!(links.is_empty());
        assert_eq!(backend.mutations(), 0);
    }

    #[test]
    fn test_refresh_failure_surfaces_before_mutation() {
        let backend = backend();
        backend.set_available(false);
        let mut links = manager();

        let result = links.apply(&backend, &include("application.name", "Firefox"));

        assert_matches!(result, Err(Error::ServerUnavailable(_)));
        assert_eq!(backend.mutations(), 0);
    }

    #[test]
    fn test_target_name_constant_matches_default_config() {
        assert_eq!(Config::default().target.name, TARGET);
    }

    fn port(id: u32, direction: PortDirection, channel: Option<&str>) -> PortInfo {
        PortInfo {
            id,
            node_id: 0,
            name: String::new(),
            direction,
            channel: channel.map(String::from),
            is_monitor: false,
        }
    }

    #[test]
    fn test_pair_ports_by_channel() {
        let fl = port(1, PortDirection::Output, Some("FL"));
        let fr = port(2, PortDirection::Output, Some("FR"));
        let in_fr = port(11, PortDirection::Input, Some("FR"));
        let in_fl = port(10, PortDirection::Input, Some("FL"));

        assert_eq!(pair_ports(&[&fl, &fr], &[&in_fr, &in_fl]), vec![(1, 10), (2, 11)]);
    }

    #[test]
    fn test_pair_ports_mono_fans_out() {
        let mono = port(1, PortDirection::Output, Some("MONO"));
        let other = port(2, PortDirection::Output, Some("LFE"));
        let in_fl = port(10, PortDirection::Input, Some("FL"));
        let in_fr = port(11, PortDirection::Input, Some("FR"));

        assert_eq!(
            pair_ports(&[&mono, &other], &[&in_fl, &in_fr]),
            vec![(1, 10), (1, 11), (2, 11)]
        );
    }

    #[test]
    fn test_pair_ports_without_inputs() {
        let fl = port(1, PortDirection::Output, Some("FL"));
        assert!(pair_ports(&[&fl], &[]).is_empty());
    }
}
