//! `tenantbox stop`: Stop and remove a user's container.

use clap::Args;
use tenantbox_runtime::coordinator::Coordinator;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// User identity.
    pub identity: String,
}

/// Executes the `stop` command.
///
/// Removal is destructive: the container is deleted, not paused.
///
/// # Errors
///
/// Returns an error if there is no container or removal fails.
pub fn execute(coordinator: &Coordinator, args: &StopArgs) -> anyhow::Result<()> {
    let identity = super::identity(&args.identity)?;
    let outcome = coordinator.stop_and_remove(&identity)?;
    println!("{}", outcome.message());
    Ok(())
}
