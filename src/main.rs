//! # Rollcall — attendance notifier
//!
//! Usage:
//!   rollcall                         # serve webhooks + run the daily scheduler
//!   rollcall run-job morning         # broadcast one job now
//!   rollcall summary 22CS001         # print a student's summary and messages
//!   rollcall --dry-run --fixtures fixtures.json serve

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_channels::Notifier;
use rollcall_core::traits::{MessageGateway, RecordStore};
use rollcall_core::{Clock, RollcallConfig, SystemClock};
use rollcall_engine::{Aggregator, EventHandlers, MessageKind, format};
use rollcall_gateway::AppState;
use rollcall_scheduler::{Broadcaster, SchedulerEngine, spawn_scheduler};
use rollcall_store::{MemoryStore, SupabaseStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rollcall",
    version,
    about = "📋 Rollcall — attendance summaries and absence alerts over WhatsApp"
)]
struct Cli {
    /// Config file (defaults to ./rollcall.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log messages instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Read records from a JSON fixtures file instead of Supabase
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve change-event webhooks and run the daily scheduler (default)
    Serve,
    /// Run one broadcast job immediately
    RunJob {
        /// morning or evening
        kind: MessageKind,
    },
    /// Print a student's summary and every rendered message, without sending
    Summary {
        roll_no: String,
    },
}

/// Everything wired together from configuration.
struct Services {
    config: RollcallConfig,
    clock: Arc<dyn Clock>,
    aggregator: Arc<Aggregator>,
    notifier: Arc<Notifier>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "rollcall=debug,tower_http=debug"
    } else {
        "rollcall=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let services = connect(&cli).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(services).await,
        Command::RunJob { kind } => {
            let broadcaster = broadcaster(&services);
            let report = broadcaster.run(kind).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Summary { roll_no } => {
            let summary = services.aggregator.compute_summary(&roll_no).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("\n--- morning ---\n{}", format::morning(&summary));
            println!("\n--- evening ---\n{}", format::evening(&summary));
            println!("\n--- welcome ---\n{}", format::welcome(&summary));
            Ok(())
        }
    }
}

/// Load configuration, build the clients and verify both are reachable.
/// Any failure here stops the process before it serves anything.
async fn connect(cli: &Cli) -> Result<Services> {
    let mut config = RollcallConfig::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.gateway.provider = "log".into();
    }

    let store: Arc<dyn RecordStore> = match &cli.fixtures {
        Some(path) => {
            config.validate_without_store()?;
            Arc::new(MemoryStore::load_fixtures(config.store.clone(), path)?)
        }
        None => {
            config.validate()?;
            Arc::new(SupabaseStore::new(config.store.clone()))
        }
    };
    let gateway: Arc<dyn MessageGateway> = rollcall_channels::create_gateway(&config.gateway)?.into();

    store
        .ping()
        .await
        .with_context(|| format!("record store '{}' unreachable", store.name()))?;
    gateway
        .ping()
        .await
        .with_context(|| format!("messaging gateway '{}' rejected credentials", gateway.name()))?;
    tracing::info!("✅ Connected to {} and {}.", store.name(), gateway.name());

    let clock: Arc<dyn Clock> =
        Arc::new(SystemClock::from_config(config.scheduler.utc_offset.as_deref())?);
    match &config.scheduler.utc_offset {
        Some(offset) => tracing::info!("Dated columns follow UTC{offset}"),
        None => tracing::info!("Dated columns follow server local time"),
    }

    let aggregator = Arc::new(Aggregator::new(store, config.subject_sources(), clock.clone()));
    let notifier = Arc::new(Notifier::new(gateway));

    Ok(Services {
        config,
        clock,
        aggregator,
        notifier,
    })
}

fn broadcaster(services: &Services) -> Arc<Broadcaster> {
    Arc::new(Broadcaster::new(
        services.aggregator.clone(),
        services.notifier.clone(),
        Duration::from_millis(services.config.scheduler.pacing_ms),
    ))
}

async fn serve(services: Services) -> Result<()> {
    let scheduler = Arc::new(tokio::sync::Mutex::new(SchedulerEngine::from_config(
        &services.config.scheduler,
        services.clock.now(),
    )?));

    tokio::spawn(spawn_scheduler(
        scheduler.clone(),
        broadcaster(&services),
        services.clock.clone(),
        services.config.scheduler.poll_secs,
    ));

    let handlers = Arc::new(EventHandlers::new(
        services.aggregator.clone(),
        services.notifier.clone(),
        &services.config.store,
    ));
    let state = AppState {
        handlers,
        notifier: services.notifier.clone(),
        scheduler,
        start_time: Instant::now(),
    };

    let addr: SocketAddr = format!("{}:{}", services.config.server.host, services.config.server.port)
        .parse()
        .context("invalid server host/port")?;
    rollcall_gateway::start(addr, state).await
}
