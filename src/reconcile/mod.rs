//! Diffing a freshly loaded candidate list against the live registry.
//!
//! A pass first collapses the candidates by uid and rejects duplicates
//! before touching the registry. It then applies removals, additions and
//! updates in that order, each ascending by uid, so the notification
//! stream is deterministic for a given input.
//!
//! A pass is not atomic across streamers: if a registry call fails midway
//! the mutations already applied stay applied, and the next successful pass
//! converges the registry again.

use crate::error::ReconcileError;
use crate::model::Streamer;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;


/// What to do with a uid present in both the registry and the candidates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Replace and notify only when the nested configuration differs
    #[default]
    Changed,
    /// Always replace and notify
    Always,
}

/// Outcome of one reconciliation pass; every list is ascending by uid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
    pub updated: Vec<i64>,
    /// Present in both with identical configuration, left in place
    pub unchanged: Vec<i64>,
}

impl ReconcileReport {
    /// No mutation was (or would be) applied
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Number of registry mutations
    pub fn mutations(&self) -> usize {
        self.added.len() + self.removed.len() + self.updated.len()
    }

    pub fn summary(&self) -> String {
        if self.is_noop() {
            return "no changes".to_string();
        }

        [
            ("added", self.added.len()),
            ("removed", self.removed.len()),
            ("updated", self.updated.len()),
        ]
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(action, n)| format!("{} {}", action, n))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Index candidates by uid, failing on the first uid seen twice
pub fn collapse(candidates: Vec<Streamer>) -> Result<BTreeMap<i64, Streamer>, ReconcileError> {
    let mut by_uid = BTreeMap::new();
    for streamer in candidates {
        let uid = streamer.uid;
        if by_uid.insert(uid, streamer).is_some() {
            return Err(ReconcileError::DuplicateInSource(uid));
        }
    }
    Ok(by_uid)
}

/// Classify every uid of `current ∪ candidate` without mutating anything
pub fn diff(
    current: &HashMap<i64, Streamer>,
    candidate: &BTreeMap<i64, Streamer>,
    policy: UpdatePolicy,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let mut union: Vec<i64> = current
        .keys()
        .chain(candidate.keys())
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    union.sort_unstable();

    for uid in union {
        match (current.get(&uid), candidate.get(&uid)) {
            (Some(_), None) => report.removed.push(uid),
            (None, Some(_)) => report.added.push(uid),
            (Some(old), Some(new)) => {
                if policy == UpdatePolicy::Always || !old.same_config(new) {
                    report.updated.push(uid);
                } else {
                    report.unchanged.push(uid);
                }
            }
            (None, None) => {}
        }
    }

    report
}

/// Populate an empty registry from the first load.
///
/// Does nothing if the registry already tracks streamers, so repeated
/// initial loads are harmless. Duplicates are rejected before the first
/// add, leaving the registry untouched.
pub fn initial_load(
    registry: &Registry,
    candidates: Vec<Streamer>,
) -> Result<ReconcileReport, ReconcileError> {
    if !registry.is_empty() {
        debug!(tracked = registry.len(), "Registry already populated, skipping initial load");
        return Ok(ReconcileReport::default());
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    for streamer in &candidates {
        if !seen.insert(streamer.uid) {
            return Err(ReconcileError::DuplicateInSource(streamer.uid));
        }
    }

    let mut report = ReconcileReport::default();
    for streamer in candidates {
        let uid = streamer.uid;
        registry.add(streamer)?;
        report.added.push(uid);
    }
    report.added.sort_unstable();

    Ok(report)
}

/// Converge the registry onto `candidates`.
///
/// Returns the applied changes. `DuplicateInSource` is raised before any
/// mutation; a registry error aborts the pass where it happened.
pub fn reconcile(
    registry: &Registry,
    candidates: Vec<Streamer>,
    policy: UpdatePolicy,
) -> Result<ReconcileReport, ReconcileError> {
    let mut candidate = collapse(candidates)?;
    let current = registry.snapshot();
    let report = diff(&current, &candidate, policy);

    for &uid in &report.removed {
        registry.remove(uid)?;
    }
    for uid in &report.added {
        if let Some(streamer) = candidate.remove(uid) {
            registry.add(streamer)?;
        }
    }
    for uid in &report.updated {
        if let Some(streamer) = candidate.remove(uid) {
            registry.update(streamer)?;
        }
    }

    Ok(report)
}
