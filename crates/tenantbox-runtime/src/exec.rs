//! Output captured from commands executed inside containers.

use serde::Serialize;
use tenantbox_common::error::{Result, TenantboxError};

/// Output from an exec command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code returned by the command.
    pub exit_code: i32,
}

impl ExecOutput {
    /// Builds an output from a finished process.
    #[must_use]
    pub fn from_process(output: &std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    /// Returns `self` if the command exited with status zero.
    ///
    /// # Errors
    ///
    /// Returns [`TenantboxError::Runtime`] carrying the exit code and the
    /// captured diagnostics when the command failed.
    pub fn into_success(self, operation: &'static str) -> Result<Self> {
        if self.exit_code == 0 {
            return Ok(self);
        }
        Err(TenantboxError::Runtime {
            operation,
            detail: format!("exit code {}: {}", self.exit_code, self.diagnostic()),
        })
    }

    /// Returns stderr, or stdout when stderr is empty, trimmed.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}
