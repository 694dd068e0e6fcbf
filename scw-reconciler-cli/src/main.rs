//! Diagnostic CLI for the reconciliation engine
//!
//! Runs a single `read`, `import` or `delete` against a live resource and
//! prints the resulting state as JSON. Configuration comes from `SCW_*`
//! environment variables; logs go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scw_reconciler_core::resources::register_all;
use scw_reconciler_core::{
    AdapterRegistry, CoreError, InMemoryAdapterRegistry, ProviderConfig, ReadOutcome, Reconciler,
    ResourceState,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "scw-reconciler", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh a resource by its stored ID
    Read {
        resource_type: String,
        id: String,
    },
    /// Import an existing resource; bare UUIDs take the default locality
    Import {
        resource_type: String,
        id: String,
    },
    /// Delete a resource by ID
    Delete {
        resource_type: String,
        id: String,
    },
    /// List the registered resource types
    Types,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CoreError>() {
                Some(core) => {
                    let diagnostic = core.to_diagnostic();
                    eprintln!("error [{}]: {}", diagnostic.kind, diagnostic.message);
                }
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = ProviderConfig::from_env().context("invalid SCW_* configuration")?;
    let client = config.build_client()?;
    let registry = Arc::new(InMemoryAdapterRegistry::new());
    register_all(registry.as_ref(), client).await;

    if let Command::Types = command {
        for resource_type in registry.list_types().await {
            println!("{resource_type}");
        }
        return Ok(());
    }

    let reconciler = Reconciler::new(registry, &config);
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    match command {
        Command::Read { resource_type, id } => {
            let state = ResourceState::with_id(id.clone());
            match reconciler.read(&resource_type, &state, &cancel).await? {
                ReadOutcome::Present(fresh) => print_state(&fresh)?,
                ReadOutcome::Drifted => {
                    tracing::warn!("{resource_type} {id} no longer exists");
                    println!("null");
                }
            }
        }
        Command::Import { resource_type, id } => {
            let state = reconciler.import(&resource_type, &id, &cancel).await?;
            print_state(&state)?;
        }
        Command::Delete { resource_type, id } => {
            reconciler
                .delete(&resource_type, &ResourceState::with_id(id.clone()), &cancel)
                .await?;
            tracing::info!("{resource_type} {id} deleted");
        }
        Command::Types => {}
    }
    Ok(())
}

fn print_state(state: &ResourceState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
