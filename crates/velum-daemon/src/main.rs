//! velum-daemon: the Velum shielded pool daemon.
//!
//! Single OS process running a Tokio async runtime. Clients communicate
//! with the daemon via JSON-RPC over Unix socket; the pool engine and its
//! database sit behind one mutex, which is the serialization boundary
//! that keeps operations single-writer.

mod commands;
mod config;
mod events;
mod rpc;
mod service;

use std::sync::Arc;

use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;
use crate::service::PoolService;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Pool engine and database behind the single-writer boundary.
    pub service: Arc<tokio::sync::Mutex<PoolService>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("velum={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Velum daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = data_dir.join("velum.db");
    let conn = velum_db::open(&db_path)?;

    // 3. Build the verifier and restore the pool from disk
    let verifier = service::build_verifier(&config.pool)?;
    info!(backend = %config.pool.verifier, "verifier ready");

    let event_bus = EventBus::new(1024);
    let pool = PoolService::restore(verifier, conn, event_bus.clone())?;

    // 4. Build daemon state
    let state = Arc::new(DaemonState {
        service: Arc::new(tokio::sync::Mutex::new(pool)),
        config,
        event_bus,
    });

    // 5. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 6. Run until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
