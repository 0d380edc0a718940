//! `tenantbox start`: Create and start a user's container.

use clap::Args;
use tenantbox_runtime::coordinator::Coordinator;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// User identity.
    pub identity: String,
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if the identity is invalid or a lifecycle step fails.
pub fn execute(coordinator: &Coordinator, args: &StartArgs) -> anyhow::Result<()> {
    let identity = super::identity(&args.identity)?;
    let outcome = coordinator.ensure_started(&identity)?;
    println!("{}", outcome.message());
    Ok(())
}
