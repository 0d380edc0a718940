//! `tenantbox status`: Show the state of a user's container.

use clap::Args;
use tenantbox_runtime::coordinator::Coordinator;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// User identity.
    pub identity: String,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Returns an error if the runtime cannot be queried.
pub fn execute(coordinator: &Coordinator, args: &StatusArgs) -> anyhow::Result<()> {
    let identity = super::identity(&args.identity)?;
    let state = coordinator.get_status(&identity)?;
    println!("{identity}\t{state}");
    Ok(())
}
