//! Runtime adapter that drives a container CLI such as `udocker`.

use std::process::{Command, Stdio};

use tenantbox_common::error::{Result, TenantboxError};
use tenantbox_common::types::{LifecycleState, UserIdentity};

use super::{RuntimeAdapter, RuntimeEntry};
use crate::exec::ExecOutput;
use crate::observer::classify_status;

/// Adapter that shells out to a container CLI.
///
/// Every invocation is `<program> <global_args...> <verb> <args...>` built as
/// an argument vector. Nothing is ever passed through a shell.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    program: String,
    global_args: Vec<String>,
}

impl CliRuntime {
    /// Creates an adapter for the given program and leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, global_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            global_args,
        }
    }

    fn command(&self, verb: &str) -> Command {
        let mut command = Command::new(&self.program);
        let _ = command.args(&self.global_args).arg(verb).stdin(Stdio::null());
        command
    }

    fn run(&self, operation: &'static str, mut command: Command) -> Result<ExecOutput> {
        tracing::debug!(program = %self.program, operation, "invoking runtime");
        let output = command.output().map_err(|e| TenantboxError::Io {
            program: self.program.clone(),
            source: e,
        })?;
        let output = ExecOutput::from_process(&output);
        if output.exit_code != 0 {
            tracing::warn!(
                program = %self.program,
                operation,
                exit_code = output.exit_code,
                stderr = %output.diagnostic(),
                "runtime command failed"
            );
        }
        output.into_success(operation)
    }

    fn lookup(&self, identity: &UserIdentity) -> Result<Option<RuntimeEntry>> {
        Ok(self
            .list_containers()?
            .into_iter()
            .find(|entry| entry.name == identity.as_str()))
    }

    fn require(&self, identity: &UserIdentity) -> Result<RuntimeEntry> {
        self.lookup(identity)?.ok_or_else(|| TenantboxError::NotFound {
            identity: identity.to_string(),
        })
    }
}

impl RuntimeAdapter for CliRuntime {
    fn list_containers(&self) -> Result<Vec<RuntimeEntry>> {
        let output = self.run("ps", self.command("ps"))?;
        Ok(parse_listing(&output.stdout))
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        tracing::info!(image, "pulling image");
        let mut command = self.command("pull");
        let _ = command.arg(image);
        let _ = self.run("pull", command)?;
        Ok(())
    }

    fn create_container(&self, identity: &UserIdentity, image: &str) -> Result<()> {
        if self.lookup(identity)?.is_some() {
            return Err(TenantboxError::AlreadyExists {
                identity: identity.to_string(),
            });
        }
        let mut command = self.command("create");
        let _ = command.arg(format!("--name={identity}")).arg(image);
        let _ = self.run("create", command)?;
        Ok(())
    }

    fn start_container(&self, identity: &UserIdentity) -> Result<()> {
        let _ = self.require(identity)?;
        let mut command = self.command("start");
        let _ = command.arg(identity.as_str());
        let _ = self.run("start", command)?;
        Ok(())
    }

    fn remove_container(&self, identity: &UserIdentity) -> Result<()> {
        let _ = self.require(identity)?;
        let mut command = self.command("rm");
        let _ = command.arg(identity.as_str());
        let output = self.run("rm", command)?;
        tracing::info!(identity = %identity, stdout = %output.stdout.trim(), "container removed");
        Ok(())
    }

    fn exec_in_container(&self, identity: &UserIdentity, argv: &[String]) -> Result<ExecOutput> {
        if argv.is_empty() {
            return Err(TenantboxError::InvalidCommand {
                reason: "argument vector is empty",
            });
        }
        let entry = self.require(identity)?;
        if classify_status(&entry.status) != LifecycleState::Running {
            return Err(TenantboxError::NotRunning {
                identity: identity.to_string(),
            });
        }
        let mut command = self.command("exec");
        let _ = command.arg(identity.as_str()).args(argv);
        self.run("exec", command)
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

/// Parses the runtime's `ps` output into listing entries.
///
/// Rows look like `<id> <flags...> ['name', 'alias'] <image> <status...>`.
/// Every name in the bracketed field becomes its own entry. The status text is
/// the flag tokens between the id and the names plus the tokens after the
/// image, so an image reference never leaks into it. Rows without a bracketed
/// field are read as `<name> <status...>`.
#[must_use]
pub fn parse_listing(stdout: &str) -> Vec<RuntimeEntry> {
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("CONTAINER") {
            continue;
        }

        let bracketed = line
            .find('[')
            .and_then(|open| line[open..].find(']').map(|len| (open, open + len)));

        let Some((open, close)) = bracketed else {
            let mut tokens = line.split_whitespace();
            if let Some(name) = tokens.next() {
                entries.push(RuntimeEntry::new(name, tokens.collect::<Vec<_>>().join(" ")));
            }
            continue;
        };

        let status = line[..open]
            .split_whitespace()
            .skip(1)
            .chain(line[close + 1..].split_whitespace().skip(1))
            .collect::<Vec<_>>()
            .join(" ");

        for name in line[open + 1..close].split(',') {
            let name = name.trim().trim_matches(|c| c == '\'' || c == '"');
            if !name.is_empty() {
                entries.push(RuntimeEntry::new(name, status.clone()));
            }
        }
    }
    entries
}
