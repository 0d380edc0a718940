//! Lifecycle coordinator: serialized, idempotent per-identity operations.
//!
//! Every mutating operation holds the identity's record exclusively for its
//! whole duration and acts only on state observed after the lock was taken.
//! Operations on different identities share nothing but the brief lookup in
//! the [`RecordTable`].

use std::sync::{Arc, PoisonError};

use serde::Serialize;
use tenantbox_common::error::{Result, TenantboxError};
use tenantbox_common::types::{LifecycleState, UserIdentity};

use crate::backend::RuntimeAdapter;
use crate::exec::ExecOutput;
use crate::observer;
use crate::state::{ContainerRecord, RecordTable};

/// Non-failure result of a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The runtime was changed.
    Success {
        /// Human-readable summary.
        message: String,
    },
    /// The container was already in the requested state. Nothing was changed.
    AlreadyInState {
        /// The state it was found in.
        state: LifecycleState,
        /// Human-readable summary.
        message: String,
    },
}

impl Outcome {
    /// Returns the human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::AlreadyInState { message, .. } => message,
        }
    }
}

/// Result of a successful exec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    /// Human-readable summary.
    pub message: String,
    /// Captured output of the command.
    #[serde(flatten)]
    pub output: ExecOutput,
}

/// Serializes lifecycle operations per identity over a runtime adapter.
pub struct Coordinator {
    adapter: Arc<dyn RuntimeAdapter>,
    image: String,
    records: RecordTable,
}

impl Coordinator {
    /// Creates a coordinator that creates containers from `image`.
    #[must_use]
    pub fn new(adapter: Arc<dyn RuntimeAdapter>, image: impl Into<String>) -> Self {
        Self {
            adapter,
            image: image.into(),
            records: RecordTable::new(),
        }
    }

    /// Returns the image new containers are created from.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the runtime adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn RuntimeAdapter {
        self.adapter.as_ref()
    }

    /// Returns the cached record for an identity, if tracked and idle.
    #[must_use]
    pub fn cached(&self, identity: &UserIdentity) -> Option<ContainerRecord> {
        self.records.cached(identity)
    }

    /// Returns the number of identities with a live record.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Makes sure the identity's container exists and is running.
    ///
    /// A running container is left alone. A stopped one is started. A missing
    /// one is pulled, created, and started in that order; the first failing
    /// step aborts, and a later call resumes from whatever the runtime then
    /// reports.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::StepFailed`] naming the failed step, or the
    /// observation error if the runtime could not be listed.
    pub fn ensure_started(&self, identity: &UserIdentity) -> Result<Outcome> {
        self.exclusive(identity, |record| {
            match self.observe_into(identity, record)? {
                LifecycleState::Running => Ok(Outcome::AlreadyInState {
                    state: LifecycleState::Running,
                    message: format!("Container for {identity} is already running"),
                }),
                LifecycleState::Stopped => {
                    step(identity, "start", || self.adapter.start_container(identity))?;
                    record.reached(LifecycleState::Running);
                    Ok(Outcome::Success {
                        message: format!("Container for {identity} started successfully"),
                    })
                }
                LifecycleState::Absent | LifecycleState::Transitioning => {
                    step(identity, "pull", || self.adapter.pull_image(&self.image))?;
                    step(identity, "create", || {
                        self.adapter.create_container(identity, &self.image)
                    })?;
                    record.reached(LifecycleState::Stopped);
                    step(identity, "start", || self.adapter.start_container(identity))?;
                    record.reached(LifecycleState::Running);
                    Ok(Outcome::Success {
                        message: format!(
                            "Container for {identity} created and started successfully"
                        ),
                    })
                }
            }
        })
    }

    /// Stops and deletes the identity's container.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::NotFound`] without touching the runtime if
    /// there is no container, or [`TenantboxError::StepFailed`] if removal
    /// fails (the container is then still there).
    pub fn stop_and_remove(&self, identity: &UserIdentity) -> Result<Outcome> {
        self.exclusive(identity, |record| {
            if self.observe_into(identity, record)? == LifecycleState::Absent {
                return Err(TenantboxError::NotFound {
                    identity: identity.to_string(),
                });
            }
            step(identity, "remove", || self.adapter.remove_container(identity))?;
            record.reached(LifecycleState::Absent);
            Ok(Outcome::Success {
                message: format!("Container for {identity} stopped and removed successfully"),
            })
        })
    }

    /// Runs an argument vector inside the identity's running container.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::InvalidCommand`] for an empty vector,
    /// [`TenantboxError::NotFound`] if there is no container,
    /// [`TenantboxError::NotRunning`] if it is stopped, or
    /// [`TenantboxError::StepFailed`] if the command or the runtime fails.
    pub fn exec_in(&self, identity: &UserIdentity, argv: &[String]) -> Result<ExecOutcome> {
        if argv.is_empty() {
            return Err(TenantboxError::InvalidCommand {
                reason: "argument vector is empty",
            });
        }
        self.exclusive(identity, |record| {
            match self.observe_into(identity, record)? {
                LifecycleState::Absent | LifecycleState::Transitioning => {
                    Err(TenantboxError::NotFound {
                        identity: identity.to_string(),
                    })
                }
                LifecycleState::Stopped => Err(TenantboxError::NotRunning {
                    identity: identity.to_string(),
                }),
                LifecycleState::Running => {
                    tracing::info!(identity = %identity, argv = ?argv, "exec into container");
                    let output =
                        step(identity, "exec", || self.adapter.exec_in_container(identity, argv))?;
                    Ok(ExecOutcome {
                        message: format!("Command executed in container {identity} successfully"),
                        output,
                    })
                }
            }
        })
    }

    /// Reports the identity's current state from a fresh observation.
    ///
    /// Waits for an in-flight mutating operation on the same identity to
    /// finish; concurrent status reads do not block each other.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime listing fails.
    pub fn get_status(&self, identity: &UserIdentity) -> Result<LifecycleState> {
        let handle = self.records.handle(identity);
        let result = {
            let _shared = handle.read().unwrap_or_else(PoisonError::into_inner);
            observer::observe(self.adapter.as_ref(), identity)
        };
        self.records.release(identity, handle);
        result
    }

    /// Runs `op` with the identity's record held exclusively.
    fn exclusive<T>(
        &self,
        identity: &UserIdentity,
        op: impl FnOnce(&mut ContainerRecord) -> Result<T>,
    ) -> Result<T> {
        let handle = self.records.handle(identity);
        let result = {
            let mut record = handle.write().unwrap_or_else(|poisoned| {
                tracing::warn!(identity = %identity, "recovering record after a crashed operation");
                handle.clear_poison();
                poisoned.into_inner()
            });
            let before = record.lifecycle_state;
            record.begin();
            let result = op(&mut record);
            record.finish();
            if before != record.lifecycle_state {
                tracing::info!(
                    identity = %identity,
                    from = %before,
                    to = %record.lifecycle_state,
                    "lifecycle transition"
                );
            }
            result
        };
        self.records.release(identity, handle);
        result
    }

    fn observe_into(
        &self,
        identity: &UserIdentity,
        record: &mut ContainerRecord,
    ) -> Result<LifecycleState> {
        let state = observer::observe(self.adapter.as_ref(), identity)?;
        record.observed(state);
        Ok(state)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("image", &self.image)
            .field("tracked", &self.records.len())
            .finish_non_exhaustive()
    }
}

/// Runs one runtime call, tagging a failure with the step's name.
fn step<T>(
    identity: &UserIdentity,
    name: &'static str,
    call: impl FnOnce() -> Result<T>,
) -> Result<T> {
    call().map_err(|e| {
        tracing::error!(identity = %identity, step = name, error = %e, "lifecycle step failed");
        TenantboxError::StepFailed {
            identity: identity.to_string(),
            step: name,
            source: Box::new(e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryRuntime, RuntimeCall, RuntimeOp};

    fn id(raw: &str) -> UserIdentity {
        UserIdentity::parse(raw).unwrap()
    }

    fn setup() -> (Arc<MemoryRuntime>, Coordinator) {
        let runtime = Arc::new(MemoryRuntime::new());
        let coordinator = Coordinator::new(runtime.clone(), "img:1");
        (runtime, coordinator)
    }

    #[test]
    fn stopped_container_is_started_without_create() {
        let (rt, c) = setup();
        rt.seed("dave", false);
        let outcome = c.ensure_started(&id("dave")).unwrap();
        assert_eq!(outcome.message(), "Container for dave started successfully");
        assert_eq!(rt.mutations(), vec![RuntimeCall::Start("dave".into())]);
    }

    #[test]
    fn failed_pull_aborts_before_create() {
        let (rt, c) = setup();
        rt.fail_next(RuntimeOp::Pull, "registry unreachable");
        let err = c.ensure_started(&id("erin")).unwrap_err();
        match &err {
            TenantboxError::StepFailed { step, .. } => assert_eq!(*step, "pull"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("registry unreachable"));
        assert_eq!(rt.mutations(), vec![RuntimeCall::Pull("img:1".into())]);
    }

    #[test]
    fn failed_start_resumes_on_next_call() {
        let (rt, c) = setup();
        rt.fail_next(RuntimeOp::Start, "cgroup busy");
        let err = c.ensure_started(&id("erin")).unwrap_err();
        assert!(matches!(err, TenantboxError::StepFailed { step: "start", .. }));
        assert_eq!(
            c.cached(&id("erin")).map(|r| r.lifecycle_state),
            Some(LifecycleState::Stopped)
        );

        let outcome = c.ensure_started(&id("erin")).unwrap();
        assert_eq!(outcome.message(), "Container for erin started successfully");
        let creates = rt
            .mutations()
            .into_iter()
            .filter(|call| matches!(call, RuntimeCall::Create(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[test]
    fn failed_remove_leaves_container() {
        let (rt, c) = setup();
        rt.seed("frank", true);
        rt.fail_next(RuntimeOp::Remove, "device busy");
        let err = c.stop_and_remove(&id("frank")).unwrap_err();
        assert!(matches!(err, TenantboxError::StepFailed { step: "remove", .. }));
        assert_eq!(c.get_status(&id("frank")).unwrap(), LifecycleState::Running);
    }

    #[test]
    fn exec_in_stopped_container_is_precondition_failure() {
        let (rt, c) = setup();
        rt.seed("gina", false);
        let err = c.exec_in(&id("gina"), &["ls".into()]).unwrap_err();
        assert!(matches!(err, TenantboxError::NotRunning { .. }));
        assert!(rt.mutations().is_empty());
    }

    #[test]
    fn exec_with_empty_argv_never_reaches_runtime() {
        let (rt, c) = setup();
        rt.seed("gina", true);
        let err = c.exec_in(&id("gina"), &[]).unwrap_err();
        assert!(matches!(err, TenantboxError::InvalidCommand { .. }));
        assert!(rt.calls().is_empty());
    }

    #[test]
    fn failing_command_is_reported_as_exec_step() {
        let (rt, c) = setup();
        rt.seed("gina", true);
        let err = c.exec_in(&id("gina"), &["false".into()]).unwrap_err();
        assert!(matches!(err, TenantboxError::StepFailed { step: "exec", .. }));
    }

    #[test]
    fn listing_failure_surfaces_from_status() {
        let (rt, c) = setup();
        rt.fail_next(RuntimeOp::List, "runtime wedged");
        let err = c.get_status(&id("hana")).unwrap_err();
        assert!(matches!(err, TenantboxError::Runtime { operation: "ps", .. }));
    }

    #[test]
    fn removed_identities_are_evicted() {
        let (_rt, c) = setup();
        let _ = c.ensure_started(&id("ivan")).unwrap();
        assert_eq!(c.tracked(), 1);
        let _ = c.stop_and_remove(&id("ivan")).unwrap();
        assert_eq!(c.tracked(), 0);
        assert_eq!(c.get_status(&id("ivan")).unwrap(), LifecycleState::Absent);
        assert_eq!(c.tracked(), 0);
    }
}
