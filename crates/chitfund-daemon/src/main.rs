// crates/chitfund-daemon/src/main.rs
//
// Binary entrypoint for the chit fund daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, opens the
// store once, wires the registry and session table into the RPC server,
// and serves until Ctrl-C. On shutdown the store is flushed and dropped.

mod config;
mod state;

use std::sync::Arc;

use clap::Parser;
use config::DaemonConfig;
use state::{ServiceState, ServiceStateMachine};

use chitfund_core::crypto::{decode_secret, generate_secret};
use chitfund_core::traits::{FundStore, MemberStore, UserStore};
use chitfund_engine::FundRegistry;
use chitfund_rpc::{FundRpcServer, RpcConfig, SessionManager};
use chitfund_store::{InMemoryStore, RocksStore};

/// Chit fund daemon: serves the fund administration RPC API.
#[derive(Parser, Debug)]
#[command(name = "chitfund-daemon", version = "0.1.0", about = "Chit fund administration daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.chitfund/config.toml")]
    config: String,

    /// Keep all data in memory, overriding the config file.
    #[arg(long)]
    in_memory: bool,
}

/// The opened backing store, shared by every trait object handed out.
enum OpenedStore {
    Rocks(Arc<RocksStore>),
    Memory(Arc<InMemoryStore>),
}

impl OpenedStore {
    fn open(config: &DaemonConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if config.in_memory {
            tracing::warn!("Running with in-memory storage; data is lost on exit");
            return Ok(OpenedStore::Memory(Arc::new(InMemoryStore::new())));
        }
        let path = config.rocksdb_path();
        if let Some(parent) = std::path::Path::new(&path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = RocksStore::open(&path)
            .map_err(|e| format!("Failed to open RocksDB at {}: {}", path, e))?;
        tracing::info!("RocksDB opened at {}", path);
        Ok(OpenedStore::Rocks(Arc::new(store)))
    }

    fn handles(&self) -> (Arc<dyn MemberStore>, Arc<dyn FundStore>, Arc<dyn UserStore>) {
        match self {
            OpenedStore::Rocks(s) => (s.clone(), s.clone(), s.clone()),
            OpenedStore::Memory(s) => (s.clone(), s.clone(), s.clone()),
        }
    }

    fn flush(&self) {
        if let OpenedStore::Rocks(store) = self {
            match store.flush() {
                Ok(()) => tracing::info!("Store flushed"),
                Err(e) => tracing::error!("Store flush failed: {}", e),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logged once the subscriber is up.
    let (mut daemon_config, load_error) = match DaemonConfig::load(&args.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (DaemonConfig::default(), Some(e.to_string())),
    };
    if args.in_memory {
        daemon_config.in_memory = true;
    }

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match load_error {
        None => tracing::info!("Loaded configuration from {}", args.config),
        Some(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    let mut state_machine = ServiceStateMachine::new();

    tracing::info!("Chit fund daemon v0.1.0");
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!("Member ID prefix: {}", daemon_config.member_id_prefix);

    let store = OpenedStore::open(&daemon_config)?;
    let (members, funds, users) = store.handles();

    let registry = Arc::new(
        FundRegistry::new(members, funds).with_member_id_prefix(&daemon_config.member_id_prefix)?,
    );

    let secret = match &daemon_config.session_secret {
        Some(hex) => decode_secret(hex)?,
        None => {
            tracing::warn!("No session_secret configured; sessions will not survive a restart");
            generate_secret()
        }
    };
    let sessions = Arc::new(SessionManager::new(secret, daemon_config.session_ttl_hours));

    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let rpc_server = FundRpcServer::new(rpc_config, registry, users, sessions.clone());

    // Drop expired sessions hourly.
    let sweeper_sessions = sessions.clone();
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let purged = sweeper_sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired sessions", purged);
            }
        }
    });

    state_machine.transition(ServiceState::Ready)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    let served = rpc_server.start_with_shutdown(shutdown).await;

    state_machine.transition(ServiceState::ShuttingDown)?;
    sweeper.abort();
    drop(rpc_server);
    store.flush();
    drop(store);

    if let Err(e) = served {
        tracing::error!("RPC server error: {}", e);
        return Err(e);
    }

    tracing::info!("Daemon stopped");
    Ok(())
}
