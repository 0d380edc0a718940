//! `tenantbox serve`: Serve the HTTP API.

use clap::Args;
use tenantbox_api::server::{ApiServer, ServerConfig};
use tenantbox_common::config::TenantboxConfig;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, as `host:port`.
    #[arg(long, env = "TENANTBOX_LISTEN")]
    pub listen: Option<String>,
}

/// Executes the `serve` command.
///
/// Builds the coordinator, binds the listener, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails.
pub fn execute(config: &TenantboxConfig) -> anyhow::Result<()> {
    let server_config = ServerConfig::parse(&config.listen)?;
    let coordinator = super::build_coordinator(config);
    tracing::info!(
        runtime = %config.runtime.kind,
        program = %config.runtime.program,
        "starting tenantbox"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(ApiServer::new(server_config, coordinator).run())?;
    Ok(())
}
