//! In-process simulated runtime.
//!
//! Keeps containers in a table instead of talking to a real runtime. Used by
//! `--runtime memory` for local development and by the test suites, which
//! rely on its call journal, injected latency, and one-shot failures.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tenantbox_common::error::{Result, TenantboxError};
use tenantbox_common::types::UserIdentity;

use super::{RuntimeAdapter, RuntimeEntry};
use crate::exec::ExecOutput;

/// Operation kinds, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeOp {
    /// `list_containers`
    List,
    /// `pull_image`
    Pull,
    /// `create_container`
    Create,
    /// `start_container`
    Start,
    /// `remove_container`
    Remove,
    /// `exec_in_container`
    Exec,
}

impl RuntimeOp {
    const fn name(self) -> &'static str {
        match self {
            Self::List => "ps",
            Self::Pull => "pull",
            Self::Create => "create",
            Self::Start => "start",
            Self::Remove => "rm",
            Self::Exec => "exec",
        }
    }
}

/// A call received by the simulated runtime, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// Listing requested.
    List,
    /// Image pull requested.
    Pull(String),
    /// Container creation requested.
    Create(String),
    /// Container start requested.
    Start(String),
    /// Container removal requested.
    Remove(String),
    /// Command execution requested.
    Exec(String, Vec<String>),
}

/// Handshake with a call held by [`MemoryRuntime::pause_next`].
///
/// Dropping it without calling [`PausedCall::resume`] also lets the call go.
#[derive(Debug)]
pub struct PausedCall {
    entered: Receiver<()>,
    resume: Sender<()>,
}

impl PausedCall {
    /// Blocks until the paused call has reached the runtime.
    pub fn wait_entered(&self) {
        let _ = self.entered.recv();
    }

    /// Lets the paused call continue.
    pub fn resume(self) {
        let _ = self.resume.send(());
    }
}

#[derive(Debug, Default)]
struct Table {
    images: HashSet<String>,
    containers: HashMap<String, bool>,
    journal: Vec<RuntimeCall>,
    failures: HashMap<RuntimeOp, String>,
    pauses: HashMap<RuntimeOp, (Sender<()>, Receiver<()>)>,
}

/// Simulated container runtime.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    table: Mutex<Table>,
    latency: Duration,
}

impl MemoryRuntime {
    /// Creates an empty runtime that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every mutating call by `latency`, outside the table lock.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Adds a container directly, bypassing the journal.
    pub fn seed(&self, name: &str, running: bool) {
        let _ = self.lock().containers.insert(name.to_string(), running);
    }

    /// Makes the next call of `op` fail with `detail`.
    pub fn fail_next(&self, op: RuntimeOp, detail: impl Into<String>) {
        let _ = self.lock().failures.insert(op, detail.into());
    }

    /// Holds the next call of `op` until the returned handle resumes it.
    #[must_use]
    pub fn pause_next(&self, op: RuntimeOp) -> PausedCall {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let _ = self.lock().pauses.insert(op, (entered_tx, resume_rx));
        PausedCall {
            entered: entered_rx,
            resume: resume_tx,
        }
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.lock().journal.clone()
    }

    /// Returns the calls received so far, excluding listings.
    #[must_use]
    pub fn mutations(&self) -> Vec<RuntimeCall> {
        self.calls()
            .into_iter()
            .filter(|call| *call != RuntimeCall::List)
            .collect()
    }

    /// Returns whether an image has been pulled.
    #[must_use]
    pub fn has_image(&self, image: &str) -> bool {
        self.lock().images.contains(image)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journals the call, honours a pending pause, waits out the latency,
    /// then takes the table if no failure was injected for `op`.
    fn enter(&self, op: RuntimeOp, call: RuntimeCall) -> Result<MutexGuard<'_, Table>> {
        let (injected, pause) = {
            let mut table = self.lock();
            table.journal.push(call);
            (table.failures.remove(&op), table.pauses.remove(&op))
        };
        if let Some((entered, resume)) = pause {
            let _ = entered.send(());
            let _ = resume.recv();
        }
        if let Some(detail) = injected {
            return Err(TenantboxError::Runtime {
                operation: op.name(),
                detail,
            });
        }
        if op != RuntimeOp::List && !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok(self.lock())
    }
}

impl RuntimeAdapter for MemoryRuntime {
    fn list_containers(&self) -> Result<Vec<RuntimeEntry>> {
        let table = self.enter(RuntimeOp::List, RuntimeCall::List)?;
        let mut entries: Vec<_> = table
            .containers
            .iter()
            .map(|(name, running)| {
                RuntimeEntry::new(name.clone(), if *running { "running" } else { "stopped" })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        let mut table = self.enter(RuntimeOp::Pull, RuntimeCall::Pull(image.to_string()))?;
        let _ = table.images.insert(image.to_string());
        Ok(())
    }

    fn create_container(&self, identity: &UserIdentity, image: &str) -> Result<()> {
        let name = identity.to_string();
        let mut table = self.enter(RuntimeOp::Create, RuntimeCall::Create(name.clone()))?;
        if !table.images.contains(image) {
            return Err(TenantboxError::Runtime {
                operation: "create",
                detail: format!("image {image} is not available locally"),
            });
        }
        if table.containers.contains_key(&name) {
            return Err(TenantboxError::AlreadyExists { identity: name });
        }
        let _ = table.containers.insert(name, false);
        Ok(())
    }

    fn start_container(&self, identity: &UserIdentity) -> Result<()> {
        let name = identity.to_string();
        let mut table = self.enter(RuntimeOp::Start, RuntimeCall::Start(name.clone()))?;
        match table.containers.get_mut(&name) {
            Some(running) => {
                *running = true;
                Ok(())
            }
            None => Err(TenantboxError::NotFound { identity: name }),
        }
    }

    fn remove_container(&self, identity: &UserIdentity) -> Result<()> {
        let name = identity.to_string();
        let mut table = self.enter(RuntimeOp::Remove, RuntimeCall::Remove(name.clone()))?;
        match table.containers.remove(&name) {
            Some(_) => Ok(()),
            None => Err(TenantboxError::NotFound { identity: name }),
        }
    }

    fn exec_in_container(&self, identity: &UserIdentity, argv: &[String]) -> Result<ExecOutput> {
        let name = identity.to_string();
        let table = self.enter(
            RuntimeOp::Exec,
            RuntimeCall::Exec(name.clone(), argv.to_vec()),
        )?;
        match table.containers.get(&name) {
            None => return Err(TenantboxError::NotFound { identity: name }),
            Some(false) => return Err(TenantboxError::NotRunning { identity: name }),
            Some(true) => {}
        }
        drop(table);
        simulate(argv).into_success("exec")
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Gives a handful of familiar commands plausible output.
fn simulate(argv: &[String]) -> ExecOutput {
    match argv.split_first() {
        None => ExecOutput {
            stderr: "no command given".into(),
            exit_code: 125,
            ..ExecOutput::default()
        },
        Some((program, args)) if program == "echo" => ExecOutput {
            stdout: format!("{}\n", args.join(" ")),
            ..ExecOutput::default()
        },
        Some((program, _)) if program == "false" => ExecOutput {
            exit_code: 1,
            ..ExecOutput::default()
        },
        Some(_) => ExecOutput::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> UserIdentity {
        UserIdentity::parse(raw).unwrap()
    }

    #[test]
    fn create_requires_pulled_image() {
        let rt = MemoryRuntime::new();
        assert!(rt.create_container(&id("alice"), "img").is_err());
        rt.pull_image("img").unwrap();
        rt.create_container(&id("alice"), "img").unwrap();
        let listing = rt.list_containers().unwrap();
        assert_eq!(listing, vec![RuntimeEntry::new("alice", "stopped")]);
    }

    #[test]
    fn duplicate_create_reports_already_exists() {
        let rt = MemoryRuntime::new();
        rt.pull_image("img").unwrap();
        rt.create_container(&id("alice"), "img").unwrap();
        let err = rt.create_container(&id("alice"), "img").unwrap_err();
        assert!(matches!(err, TenantboxError::AlreadyExists { .. }));
    }

    #[test]
    fn exec_requires_running_container() {
        let rt = MemoryRuntime::new();
        rt.seed("bob", false);
        let err = rt.exec_in_container(&id("bob"), &["true".into()]).unwrap_err();
        assert!(matches!(err, TenantboxError::NotRunning { .. }));

        rt.start_container(&id("bob")).unwrap();
        let out = rt
            .exec_in_container(&id("bob"), &["echo".into(), "hi".into()])
            .unwrap();
        assert_eq!(out.stdout, "hi\n");
    }

    #[test]
    fn failing_command_is_runtime_error() {
        let rt = MemoryRuntime::new();
        rt.seed("bob", true);
        let err = rt
            .exec_in_container(&id("bob"), &["false".into()])
            .unwrap_err();
        assert!(matches!(err, TenantboxError::Runtime { operation: "exec", .. }));
    }

    #[test]
    fn injected_failure_fires_once() {
        let rt = MemoryRuntime::new();
        rt.fail_next(RuntimeOp::Pull, "registry unreachable");
        let err = rt.pull_image("img").unwrap_err();
        assert!(err.to_string().contains("registry unreachable"));
        rt.pull_image("img").unwrap();
        assert!(rt.has_image("img"));
    }

    #[test]
    fn paused_call_waits_for_resume() {
        let rt = MemoryRuntime::new();
        let gate = rt.pause_next(RuntimeOp::Pull);
        std::thread::scope(|s| {
            let puller = s.spawn(|| rt.pull_image("img"));
            gate.wait_entered();
            assert!(!rt.has_image("img"));
            gate.resume();
            puller.join().unwrap().unwrap();
        });
        assert!(rt.has_image("img"));
    }

    #[test]
    fn journal_records_arrival_order() {
        let rt = MemoryRuntime::new();
        rt.pull_image("img").unwrap();
        rt.create_container(&id("carol"), "img").unwrap();
        rt.start_container(&id("carol")).unwrap();
        assert_eq!(
            rt.mutations(),
            vec![
                RuntimeCall::Pull("img".into()),
                RuntimeCall::Create("carol".into()),
                RuntimeCall::Start("carol".into()),
            ]
        );
    }
}
