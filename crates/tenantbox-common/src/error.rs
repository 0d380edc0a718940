//! Unified error type for the tenantbox workspace.
//!
//! Runtime adapters, the state observer, and the lifecycle coordinator all
//! report through [`TenantboxError`]. The API crate maps each variant onto an
//! HTTP status code.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TenantboxError {
    /// A user identity was rejected before reaching the runtime.
    #[error("invalid identity {identity:?}: {reason}")]
    InvalidIdentity {
        /// The rejected input.
        identity: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No container exists for the identity.
    #[error("container for {identity} not found")]
    NotFound {
        /// Identity that has no container.
        identity: String,
    },

    /// A container with the identity already exists.
    #[error("container for {identity} already exists")]
    AlreadyExists {
        /// Identity whose container already exists.
        identity: String,
    },

    /// The container exists but is not running.
    #[error("container for {identity} is not running")]
    NotRunning {
        /// Identity whose container is stopped.
        identity: String,
    },

    /// An exec request carried an unusable command.
    #[error("invalid command: {reason}")]
    InvalidCommand {
        /// Why the command was rejected.
        reason: &'static str,
    },

    /// The runtime program exited unsuccessfully.
    #[error("runtime {operation} failed: {detail}")]
    Runtime {
        /// Runtime operation that failed (`pull`, `create`, ...).
        operation: &'static str,
        /// Exit status and captured diagnostic output.
        detail: String,
    },

    /// One step of a multi-step lifecycle operation failed.
    #[error("{step} step failed for {identity}: {source}")]
    StepFailed {
        /// Identity the operation targeted.
        identity: String,
        /// Step that failed.
        step: &'static str,
        /// Underlying failure.
        source: Box<TenantboxError>,
    },

    /// The runtime program could not be spawned.
    #[error("failed to run {program}: {source}")]
    Io {
        /// Program that failed to spawn.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    ConfigIo {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl TenantboxError {
    /// Returns the innermost error, looking through [`Self::StepFailed`].
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TenantboxError>;
