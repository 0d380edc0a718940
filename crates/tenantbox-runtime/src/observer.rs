//! Derives lifecycle state from the runtime's container listing.
//!
//! [`classify_status`] is the only place raw runtime status text is
//! interpreted. Everything downstream matches on [`LifecycleState`].

use tenantbox_common::error::Result;
use tenantbox_common::types::{LifecycleState, UserIdentity};

use crate::backend::RuntimeAdapter;

/// Maps raw status text onto a lifecycle state.
///
/// A listed container is `Running` when any whitespace-separated token of
/// its status reads `running` or `up` (any case), and `Stopped` otherwise.
#[must_use]
pub fn classify_status(raw: &str) -> LifecycleState {
    let running = raw
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("running") || token.eq_ignore_ascii_case("up"));
    if running {
        LifecycleState::Running
    } else {
        LifecycleState::Stopped
    }
}

/// Observes the current state of one identity's container.
///
/// Names are compared exactly, so `bob` never matches a row for `bob2`.
///
/// # Errors
///
/// Returns an error if the runtime listing fails.
pub fn observe(adapter: &dyn RuntimeAdapter, identity: &UserIdentity) -> Result<LifecycleState> {
    let state = adapter
        .list_containers()?
        .iter()
        .filter(|entry| entry.name == identity.as_str())
        .map(|entry| classify_status(&entry.status))
        .max_by_key(|state| matches!(state, LifecycleState::Running))
        .unwrap_or(LifecycleState::Absent);
    tracing::debug!(identity = %identity, state = %state, "observed container state");
    Ok(state)
}

/// Observes every container the runtime reports.
///
/// Names that are not valid identities are skipped.
///
/// # Errors
///
/// Returns an error if the runtime listing fails.
pub fn snapshot(adapter: &dyn RuntimeAdapter) -> Result<Vec<(UserIdentity, LifecycleState)>> {
    let mut states = Vec::new();
    for entry in adapter.list_containers()? {
        match UserIdentity::parse(entry.name.as_str()) {
            Ok(identity) => states.push((identity, classify_status(&entry.status))),
            Err(e) => tracing::debug!(name = %entry.name, error = %e, "skipping foreign container"),
        }
    }
    states.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(states)
}
