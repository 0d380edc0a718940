//! `tenantbox ps`: List every container the runtime reports.

use clap::Args;
use tenantbox_common::types::{LifecycleState, UserIdentity};
use tenantbox_runtime::coordinator::Coordinator;
use tenantbox_runtime::observer;

use crate::output;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show only running containers.
    #[arg(short, long)]
    pub running: bool,
}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the runtime listing fails.
pub fn execute(coordinator: &Coordinator, args: &PsArgs) -> anyhow::Result<()> {
    let states = observer::snapshot(coordinator.adapter())?;
    let rows = select(states, args.running);

    if rows.is_empty() {
        println!("No containers found.");
        return Ok(());
    }
    print!("{}", output::format_table(&rows));
    Ok(())
}

fn select(
    states: Vec<(UserIdentity, LifecycleState)>,
    running_only: bool,
) -> Vec<(UserIdentity, LifecycleState)> {
    states
        .into_iter()
        .filter(|(_, state)| !running_only || *state == LifecycleState::Running)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<(UserIdentity, LifecycleState)> {
        vec![
            (UserIdentity::parse("alice").unwrap(), LifecycleState::Running),
            (UserIdentity::parse("bob").unwrap(), LifecycleState::Stopped),
        ]
    }

    #[test]
    fn lists_every_container_by_default() {
        assert_eq!(select(states(), false), states());
    }

    #[test]
    fn running_flag_hides_stopped_containers() {
        let rows = select(states(), true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.as_str(), "alice");
    }
}
