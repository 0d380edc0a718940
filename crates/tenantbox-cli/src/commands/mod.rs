//! CLI command definitions and dispatch.

pub mod exec;
pub mod ps;
pub mod serve;
pub mod start;
pub mod status;
pub mod stop;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tenantbox_common::config::{RuntimeKind, TenantboxConfig};
use tenantbox_common::types::UserIdentity;
use tenantbox_runtime::backend;
use tenantbox_runtime::coordinator::Coordinator;

/// tenantbox: per-user sandbox containers on a single host.
#[derive(Parser, Debug)]
#[command(name = "tenantbox", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file.
    #[arg(long, global = true, env = "TENANTBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Image new containers are created from.
    #[arg(long, global = true, env = "TENANTBOX_IMAGE")]
    pub image: Option<String>,

    /// Runtime adapter: `cli` or `memory`.
    #[arg(long, global = true, env = "TENANTBOX_RUNTIME")]
    pub runtime: Option<RuntimeKind>,

    /// Program driven by the `cli` runtime adapter.
    #[arg(long, global = true, env = "TENANTBOX_RUNTIME_PROGRAM")]
    pub runtime_program: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(serve::ServeArgs),
    /// Create and start (or just start) a user's container.
    Start(start::StartArgs),
    /// Stop and remove a user's container.
    Stop(stop::StopArgs),
    /// Execute a command inside a user's running container.
    Exec(exec::ExecArgs),
    /// Show the state of a user's container.
    Status(status::StatusArgs),
    /// List every container the runtime reports.
    Ps(ps::PsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    if let Command::Serve(args) = &cli.command {
        if let Some(listen) = &args.listen {
            config.listen.clone_from(listen);
        }
    }
    config.validate()?;

    match cli.command {
        Command::Serve(_) => serve::execute(&config),
        Command::Start(args) => start::execute(&build_coordinator(&config), &args),
        Command::Stop(args) => stop::execute(&build_coordinator(&config), &args),
        Command::Exec(args) => exec::execute(&build_coordinator(&config), &args),
        Command::Status(args) => status::execute(&build_coordinator(&config), &args),
        Command::Ps(args) => ps::execute(&build_coordinator(&config), &args),
    }
}

/// Layers defaults, the optional config file, and flag/env overrides.
fn load_config(cli: &Cli) -> anyhow::Result<TenantboxConfig> {
    let mut config = match &cli.config {
        Some(path) => TenantboxConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TenantboxConfig::default(),
    };
    if let Some(image) = &cli.image {
        config.image.clone_from(image);
    }
    if let Some(kind) = cli.runtime {
        config.runtime.kind = kind;
    }
    if let Some(program) = &cli.runtime_program {
        config.runtime.program.clone_from(program);
    }
    Ok(config)
}

/// Builds the coordinator for the configured runtime.
pub fn build_coordinator(config: &TenantboxConfig) -> Arc<Coordinator> {
    let adapter = backend::from_config(&config.runtime);
    if !adapter.is_available() {
        tracing::warn!(
            kind = %config.runtime.kind,
            program = %config.runtime.program,
            "container runtime not found on PATH; lifecycle calls will fail"
        );
    }
    Arc::new(Coordinator::new(adapter, config.image.clone()))
}

/// Parses a positional identity argument.
fn identity(raw: &str) -> anyhow::Result<UserIdentity> {
    Ok(UserIdentity::parse(raw)?)
}
