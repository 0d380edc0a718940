//! In-memory container records and the per-identity lock table.
//!
//! Records are an advisory cache of what the runtime last reported. The
//! runtime stays the source of truth: every coordinator operation re-observes
//! after taking the record's lock, and a restarted process simply starts with
//! an empty table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use chrono::{DateTime, Utc};
use tenantbox_common::types::{LifecycleState, UserIdentity};

/// Cached state for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Identity the record belongs to.
    pub identity: UserIdentity,
    /// Current lifecycle state, `Transitioning` while an operation runs.
    pub lifecycle_state: LifecycleState,
    /// Time of the last successful observation.
    pub last_observed_at: Option<DateTime<Utc>>,
    settled: LifecycleState,
}

impl ContainerRecord {
    /// Creates a record for an identity that has not been observed yet.
    #[must_use]
    pub const fn new(identity: UserIdentity) -> Self {
        Self {
            identity,
            lifecycle_state: LifecycleState::Absent,
            last_observed_at: None,
            settled: LifecycleState::Absent,
        }
    }

    /// Marks the start of a mutating operation.
    pub(crate) fn begin(&mut self) {
        if self.lifecycle_state != LifecycleState::Transitioning {
            self.settled = self.lifecycle_state;
        }
        self.lifecycle_state = LifecycleState::Transitioning;
    }

    /// Records a fresh observation of the runtime.
    pub(crate) fn observed(&mut self, state: LifecycleState) {
        self.settled = state;
        self.last_observed_at = Some(Utc::now());
    }

    /// Records the state reached by a successful runtime call.
    pub(crate) const fn reached(&mut self, state: LifecycleState) {
        self.settled = state;
    }

    /// Ends the operation, leaving the last known state in place.
    pub(crate) const fn finish(&mut self) {
        self.lifecycle_state = self.settled;
    }
}

/// Shared handle to one identity's record.
pub type RecordHandle = Arc<RwLock<ContainerRecord>>;

/// Lock table keyed by identity.
///
/// The table's own mutex is held only to look up or insert a handle, never
/// while a runtime call is in flight, so identities never wait on each other.
#[derive(Debug, Default)]
pub struct RecordTable {
    records: Mutex<HashMap<UserIdentity, RecordHandle>>,
}

impl RecordTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `identity`, creating the record on first use.
    pub fn handle(&self, identity: &UserIdentity) -> RecordHandle {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            records
                .entry(identity.clone())
                .or_insert_with(|| Arc::new(RwLock::new(ContainerRecord::new(identity.clone())))),
        )
    }

    /// Gives back a handle and evicts the record if it is idle and `Absent`.
    ///
    /// New handles are only handed out under the table mutex, so a strong
    /// count of one seen under that mutex means no caller holds the record.
    pub fn release(&self, identity: &UserIdentity, handle: RecordHandle) {
        drop(handle);
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let idle_and_absent = records.get(identity).is_some_and(|entry| {
            Arc::strong_count(entry) == 1
                && entry
                    .try_read()
                    .is_ok_and(|record| record.lifecycle_state == LifecycleState::Absent)
        });
        if idle_and_absent {
            let _ = records.remove(identity);
            tracing::debug!(identity = %identity, "evicted idle record");
        }
    }

    /// Returns a copy of the cached record, if one is tracked and not locked
    /// for writing. A record left behind by a panicked operation is still
    /// returned.
    pub fn cached(&self, identity: &UserIdentity) -> Option<ContainerRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = records.get(identity)?;
        match handle.try_read() {
            Ok(record) => Some(record.clone()),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().clone()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Returns the number of tracked identities.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no identity is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> UserIdentity {
        UserIdentity::parse(raw).unwrap()
    }

    #[test]
    fn new_record_is_absent_and_unobserved() {
        let record = ContainerRecord::new(id("alice"));
        assert_eq!(record.lifecycle_state, LifecycleState::Absent);
        assert!(record.last_observed_at.is_none());
    }

    #[test]
    fn failed_operation_keeps_observed_state() {
        let mut record = ContainerRecord::new(id("alice"));
        record.begin();
        assert_eq!(record.lifecycle_state, LifecycleState::Transitioning);
        record.observed(LifecycleState::Stopped);
        record.finish();
        assert_eq!(record.lifecycle_state, LifecycleState::Stopped);
        assert!(record.last_observed_at.is_some());
    }

    #[test]
    fn unobserved_failure_restores_previous_state() {
        let mut record = ContainerRecord::new(id("alice"));
        record.begin();
        record.reached(LifecycleState::Running);
        record.finish();

        record.begin();
        record.finish();
        assert_eq!(record.lifecycle_state, LifecycleState::Running);
    }

    #[test]
    fn same_identity_shares_one_handle() {
        let table = RecordTable::new();
        let a = table.handle(&id("alice"));
        let b = table.handle(&id("alice"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn release_evicts_idle_absent_records() {
        let table = RecordTable::new();
        let handle = table.handle(&id("alice"));
        table.release(&id("alice"), handle);
        assert!(table.is_empty());
    }

    #[test]
    fn release_keeps_records_still_in_use() {
        let table = RecordTable::new();
        let first = table.handle(&id("alice"));
        let second = table.handle(&id("alice"));
        table.release(&id("alice"), first);
        assert_eq!(table.len(), 1);
        table.release(&id("alice"), second);
        assert!(table.is_empty());
    }

    #[test]
    fn cached_survives_poisoned_record() {
        let table = RecordTable::new();
        let handle = table.handle(&id("alice"));
        let poisoner = Arc::clone(&handle);
        let _ = std::thread::spawn(move || {
            let mut record = poisoner.write().unwrap();
            record.begin();
            panic!("operation crashed");
        })
        .join();
        assert!(handle.is_poisoned());
        assert_eq!(
            table.cached(&id("alice")).map(|r| r.lifecycle_state),
            Some(LifecycleState::Transitioning)
        );
    }

    #[test]
    fn release_keeps_existing_containers() {
        let table = RecordTable::new();
        let handle = table.handle(&id("alice"));
        {
            let mut record = handle.write().unwrap();
            record.begin();
            record.observed(LifecycleState::Running);
            record.finish();
        }
        table.release(&id("alice"), handle);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.cached(&id("alice")).map(|r| r.lifecycle_state),
            Some(LifecycleState::Running)
        );
    }
}
