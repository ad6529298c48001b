//! The patchbay facade: list streams, link them into the capture target,
//! unlink them again.
//!
//! All operations run under one session lock, so a `link` and an `unlink`
//! issued back to back never interleave their effects on the owned links.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::backend::GraphBackend;
use crate::config::Config;
use crate::error::Result;
use crate::filter::FilterRule;
use crate::link::OwnedLink;
use crate::manager::{LinkManager, LinkReport, Routing};
use crate::node::PropertyMap;

/// Mutable state guarded by the session lock.
#[derive(Debug)]
struct Session {
    /// Rule applied by the last `link`, cleared by `unlink`
    rule: Option<FilterRule>,
    links: LinkManager,
}

/// Routes matching streams into the capture target.
pub struct Patchbay<B> {
    backend: B,
    session: Mutex<Session>,
}

impl<B: GraphBackend> Patchbay<B> {
    /// Create a patchbay on top of a connected backend.
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            session: Mutex::new(Session { rule: None, links: LinkManager::new(Routing::from(config)) }),
        }
    }

    /// The backend this patchbay talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Properties of every routable stream, ascending by node id.
    ///
    /// Only the keys in `keys` are returned, or all of them when `keys` is
    /// empty. Falls back to the last known graph if the server does not
    /// answer.
    pub fn list(&self, keys: &BTreeSet<String>) -> Vec<PropertyMap> {
        let session = self.session.lock();

        let snapshot = match self.backend.refresh() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Refresh failed, listing last known graph");
                self.backend.snapshot()
            }
        };

        session.links.stream_nodes(&snapshot).map(|node| node.select(keys)).collect()
    }

    /// Route every stream matching `rule`, now and as streams appear.
    ///
    /// A different rule replaces the active one: its links are torn down
    /// before the new rule is applied.
    pub fn link(&self, rule: FilterRule) -> Result<LinkReport> {
        rule.validate()?;

        let mut session = self.session.lock();
        let mut report = LinkReport::default();

        if session.rule.as_ref() != Some(&rule) {
            if let Some(previous) = &session.rule {
                info!(previous = %previous, rule = %rule, "Replacing active rule");
            }
            report.merge(session.links.teardown(&self.backend));
        }

        session.rule = Some(rule.clone());
        match session.links.apply(&self.backend, &rule) {
            Ok(applied) => report.merge(applied),
            Err(e) => {
                if !report.is_noop() {
                    warn!(
                        removed = report.removed,
                        failed = report.failures.len(),
                        error = %e,
                        "Previous rule torn down but the new one could not be applied"
                    );
                    for failure in &report.failures {
                        warn!(error = %failure, "Teardown failure");
                    }
                }
                return Err(e);
            }
        }

        if report.target_missing {
            warn!(
                target = %session.links.routing().target_name,
                "Capture target not found, streams will be linked once it appears"
            );
        }

        info!(rule = %rule, owned = session.links.len(), "Rule active");
        Ok(report)
    }

    /// Remove every link and forget the active rule. Safe to call when
    /// nothing is linked.
    pub fn unlink(&self) -> LinkReport {
        let mut session = self.session.lock();

        if let Some(rule) = session.rule.take() {
            info!(rule = %rule, "Unlinking");
        }
        session.links.teardown(&self.backend)
    }

    /// Re-apply the active rule to the current graph.
    ///
    /// Returns `None` when no rule is active.
    pub fn reconcile(&self) -> Result<Option<LinkReport>> {
        let mut session = self.session.lock();

        let Some(rule) = session.rule.clone() else {
            return Ok(None);
        };
        session.links.apply(&self.backend, &rule).map(Some)
    }

    /// Whether the graph server answers. Never fails.
    pub fn is_available(&self) -> bool {
        self.backend.probe()
    }

    /// The rule applied by the last `link`, if any.
    pub fn active_rule(&self) -> Option<FilterRule> {
        self.session.lock().rule.clone()
    }

    /// Links currently owned.
    pub fn owned_links(&self) -> Vec<OwnedLink> {
        self.session.lock().links.owned().cloned().collect()
    }
}
