//! Runtime adapter abstraction over the container runtime.

pub mod cli;
pub mod memory;

use std::sync::Arc;

use tenantbox_common::config::{RuntimeConfig, RuntimeKind};
use tenantbox_common::error::Result;
use tenantbox_common::types::UserIdentity;

use crate::exec::ExecOutput;

/// One row of the runtime's container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEntry {
    /// Container name exactly as the runtime reports it.
    pub name: String,
    /// Raw status text in the runtime's own vocabulary.
    pub status: String,
}

impl RuntimeEntry {
    /// Creates a listing entry.
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

/// Primitive operations of a container runtime.
///
/// Every call is synchronous and may block for as long as the runtime takes
/// (image pulls in particular). Implementations never retry.
pub trait RuntimeAdapter: Send + Sync {
    /// Lists every container visible to the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    fn list_containers(&self) -> Result<Vec<RuntimeEntry>>;

    /// Pulls an image. Pulling an image that is already cached is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    fn pull_image(&self, image: &str) -> Result<()>;

    /// Creates a container named after the identity.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the name is taken, or a runtime error.
    fn create_container(&self, identity: &UserIdentity, image: &str) -> Result<()>;

    /// Starts an existing container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such container, or a runtime error.
    fn start_container(&self, identity: &UserIdentity) -> Result<()>;

    /// Stops the container if it is running, then deletes it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such container, or a runtime error.
    fn remove_container(&self, identity: &UserIdentity) -> Result<()>;

    /// Executes an argument vector inside a running container.
    ///
    /// Each element of `argv` reaches the runtime as a separate argument.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotRunning`, or a runtime error if the command
    /// exits with a non-zero status.
    fn exec_in_container(&self, identity: &UserIdentity, argv: &[String]) -> Result<ExecOutput>;

    /// Returns whether the runtime can be reached on this host.
    fn is_available(&self) -> bool;
}

/// Builds the adapter selected by the configuration.
#[must_use]
pub fn from_config(config: &RuntimeConfig) -> Arc<dyn RuntimeAdapter> {
    match config.kind {
        RuntimeKind::Cli => Arc::new(cli::CliRuntime::new(
            config.program.clone(),
            config.global_args.clone(),
        )),
        RuntimeKind::Memory => Arc::new(memory::MemoryRuntime::new()),
    }
}
