//! `tenantbox exec`: Execute a command inside a user's running container.

use clap::Args;
use tenantbox_runtime::coordinator::Coordinator;

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// User identity.
    pub identity: String,

    /// Command to execute, one argument per word.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub argv: Vec<String>,
}

/// Executes the `exec` command, forwarding the command's stdout/stderr.
///
/// # Errors
///
/// Returns an error if the container is missing or stopped, or the command
/// fails.
pub fn execute(coordinator: &Coordinator, args: &ExecArgs) -> anyhow::Result<()> {
    let identity = super::identity(&args.identity)?;
    let outcome = coordinator.exec_in(&identity, &args.argv)?;

    if !outcome.output.stdout.is_empty() {
        print!("{}", outcome.output.stdout);
    }
    if !outcome.output.stderr.is_empty() {
        #[allow(clippy::print_stderr)]
        {
            eprint!("{}", outcome.output.stderr);
        }
    }
    tracing::info!(identity = %identity, "{}", outcome.message);
    Ok(())
}
