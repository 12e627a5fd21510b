//! veil-daemon: serves the disclosure and ledger engine over JSON-RPC.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon via newline-delimited JSON-RPC over a Unix socket. All state
//! lives in one SQLite database; every multi-entity write runs in one
//! immediate transaction.

mod clock;
mod commands;
mod config;
mod events;
mod rpc;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};
use veil_db::Database;
use veil_disclosure::DisclosureEngine;
use veil_ledger::CurrencyLedger;
use veil_quiz::QuizSessionCoordinator;
use veil_skill::{RankingCache, SkillTracker};

use crate::config::DaemonConfig;
use crate::events::{Event, EventBus};
use crate::rpc::RpcServer;

/// Configured components. Stateless apart from their settings.
pub struct Services {
    pub ledger: CurrencyLedger,
    pub quiz: QuizSessionCoordinator,
    pub disclosure: DisclosureEngine,
    pub skills: SkillTracker,
}

impl Services {
    pub fn from_config(config: &DaemonConfig) -> anyhow::Result<Self> {
        let ledger = CurrencyLedger::new();
        let skills = SkillTracker::new();
        Ok(Self {
            quiz: QuizSessionCoordinator::new(config.quiz_config(), ledger.clone()),
            disclosure: DisclosureEngine::new(
                config.scoring_config(),
                config.tier_thresholds()?,
                ledger.clone(),
                skills.clone(),
            ),
            ledger,
            skills,
        })
    }
}

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database handle. One writer at a time.
    pub db: Arc<Mutex<Database>>,
    /// Configuration.
    pub config: DaemonConfig,
    pub services: Services,
    /// Leaderboard cache, owned here rather than globally.
    pub ranking: Mutex<RankingCache>,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    pub fn new(config: DaemonConfig, db: Database) -> anyhow::Result<Self> {
        let services = Services::from_config(&config)?;
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            ranking: Mutex::new(RankingCache::new(config.cache.ranking_ttl_secs)),
            config,
            services,
            event_bus: EventBus::new(1000),
            shutdown_tx,
        })
    }
}

fn init_tracing(config: &DaemonConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.advanced.log_level))
        .add_directive("veil=info".parse()?);

    if config.advanced.log_file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(&config.advanced.log_file))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;
    init_tracing(&config)?;

    info!("Veil daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db = veil_db::open(&data_dir.join("veil.db"))?;

    // 3. Build daemon state
    let state = Arc::new(DaemonState::new(config, db)?);

    // 4. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.emit(Event::new(
        "DaemonStarted",
        clock::now(),
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    ));

    // 5. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
