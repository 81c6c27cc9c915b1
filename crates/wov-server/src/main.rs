//! `wovd` — the world server binary.
//!
//! Thin entry point wiring storage, the capability kernel, the interpreter,
//! the scheduler, and the gateway together.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use wov_capabilities::CapabilityKernel;
use wov_core::{Config, World};
use wov_dispatch::{Dispatcher, WorldImpl};
use wov_events::EventBus;
use wov_interpreter::Interpreter;
use wov_plugins::PluginRegistry;
use wov_repository::Repository;
use wov_scheduler::Scheduler;

/// The world server — a multi-user interactive world reachable over
/// JSON-RPC-over-WebSocket.
#[derive(Parser)]
#[command(name = "wovd")]
#[command(author, version, about = "World server daemon")]
struct Args {
    /// Override `PORT`.
    #[arg(long)]
    port: Option<u16>,
    /// Override `DB_PATH`.
    #[arg(long)]
    db_path: Option<String>,
    /// Enable verbose (debug) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(level)).init();

    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    let repo = Arc::new(Repository::connect_embedded(&config.db_path).await.context("failed to open repository")?);
    let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
    let events = EventBus::new();
    let fs_root = PathBuf::from(&config.db_path).join("fs");

    let world_impl = Arc::new(WorldImpl::new(repo.clone(), capabilities, events.clone(), fs_root, config.bot_id).await.context("failed to construct world")?);
    let world: Arc<dyn World> = world_impl.clone();

    let mut opcode_registry = wov_opcodes::standard_registry();
    let plugins = PluginRegistry::new();
    plugins.install_opcodes(&mut opcode_registry).context("failed to install plugin opcodes")?;
    let plugins = Arc::new(plugins);

    let interpreter = Arc::new(Interpreter::new(opcode_registry));
    world_impl.wire(world.clone(), interpreter.clone());

    let dispatcher = Arc::new(Dispatcher::new(world.clone(), interpreter.clone(), config.clone()));

    let scheduler = Scheduler::spawn(repo.clone(), dispatcher.clone(), Duration::from_millis(config.scheduler_tick_ms));
    let sweep_handle = spawn_dangling_reference_sweep(repo.clone());

    let (handle, addr) = wov_gateway::serve(config.port, world, dispatcher, interpreter, plugins, events, config).await.context("failed to start gateway")?;
    info!(%addr, "wovd listening");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutting down");

    drop(scheduler);
    sweep_handle.abort();
    handle.stop().context("failed to stop gateway")?;
    handle.stopped().await;

    Ok(())
}

/// Repair dangling `prototype_id`/`owner_id`/`location` references on a
/// fixed interval — dangling references are ignored by lookups but must be
/// repaired by a periodic sweep.
fn spawn_dangling_reference_sweep(repo: Arc<Repository>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            match repo.sweep_dangling_references().await {
                Ok(swept) if swept > 0 => info!(swept, "repaired dangling references"),
                Ok(_) => {},
                Err(e) => tracing::warn!(error = %e, "dangling reference sweep failed"),
            }
        }
    })
}
