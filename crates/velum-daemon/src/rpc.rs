//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the command handlers. `subscribe_events`
//! dedicates its connection to the event stream; clients issue further
//! requests on a separate connection.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use velum_pool::{LedgerError, PoolError};

use crate::DaemonState;
use crate::commands;
use crate::service::ServiceError;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Map a service error onto the wire taxonomy.
    pub fn from_service(err: ServiceError) -> Self {
        match err {
            ServiceError::Pool(e) => Self::from_pool(e),
            ServiceError::Ledger(e) => Self::from_ledger(e),
            ServiceError::Db(e) => Self::internal_error(&format!("persistence: {e}")),
            ServiceError::Snapshot(detail) => Self::internal_error(&detail),
        }
    }

    fn from_pool(err: PoolError) -> Self {
        match err {
            PoolError::AlreadyInitialized => Self {
                code: -32001,
                message: "ALREADY_INITIALIZED".to_string(),
                data: None,
            },
            PoolError::NotInitialized => Self {
                code: -32002,
                message: "NOT_INITIALIZED".to_string(),
                data: None,
            },
            PoolError::InvalidAmount => Self {
                code: -32003,
                message: "INVALID_AMOUNT".to_string(),
                data: None,
            },
            PoolError::InsufficientFunds {
                available,
                required,
            } => Self {
                code: -32004,
                message: "INSUFFICIENT_FUNDS".to_string(),
                data: Some(serde_json::json!({"available": available, "required": required})),
            },
            PoolError::VaultInsufficientBalance {
                vault_balance,
                required,
            } => Self {
                code: -32005,
                message: "VAULT_INSUFFICIENT_BALANCE".to_string(),
                data: Some(
                    serde_json::json!({"vault_balance": vault_balance, "required": required}),
                ),
            },
            PoolError::CommitmentAlreadyExists => Self {
                code: -32006,
                message: "COMMITMENT_EXISTS".to_string(),
                data: None,
            },
            PoolError::DoubleSpend => Self {
                code: -32007,
                message: "DOUBLE_SPEND".to_string(),
                data: None,
            },
            PoolError::InvalidProof(reason) => Self {
                code: -32008,
                message: "INVALID_PROOF".to_string(),
                data: Some(serde_json::json!({"reason": reason})),
            },
            PoolError::ArithmeticOverflow => Self {
                code: -32009,
                message: "ARITHMETIC_OVERFLOW".to_string(),
                data: None,
            },
            PoolError::Unauthorized => Self {
                code: -32010,
                message: "UNAUTHORIZED".to_string(),
                data: None,
            },
            PoolError::Halted { reason } => Self {
                code: -32011,
                message: "POOL_HALTED".to_string(),
                data: Some(serde_json::json!({"reason": reason})),
            },
        }
    }

    fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                available,
                required,
            } => Self::from_pool(PoolError::InsufficientFunds {
                available,
                required,
            }),
            LedgerError::Unauthorized => Self::from_pool(PoolError::Unauthorized),
            LedgerError::Overflow => Self::from_pool(PoolError::ArithmeticOverflow),
            LedgerError::AccountExists => Self::invalid_params("account already registered"),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => request,
            Err(_) => {
                let response =
                    RpcResponse::error(serde_json::Value::Null, RpcError::parse_error());
                write_json(&mut writer, &response).await?;
                continue;
            }
        };

        if request.method == "subscribe_events" {
            let response =
                RpcResponse::success(request.id, serde_json::json!({"subscribed": true}));
            write_json(&mut writer, &response).await?;
            stream_events(state, writer).await;
            return Ok(());
        }

        let response = dispatch_request(state.clone(), request).await;
        write_json(&mut writer, &response).await?;
    }

    Ok(())
}

/// Forward pool events until the subscriber disconnects.
async fn stream_events(state: Arc<DaemonState>, mut writer: OwnedWriteHalf) {
    let mut rx = state.event_bus.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                let notification = serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "pool_event",
                    "params": event,
                });
                if write_json(&mut writer, &notification).await.is_err() {
                    break; // subscriber went away
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn write_json<T: Serialize>(writer: &mut OwnedWriteHalf, value: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Pool operations
        "pool_initialize" => commands::pool::initialize(&state, &request.params).await,
        "pool_shield" => commands::pool::shield(&state, &request.params).await,
        "pool_unshield" => commands::pool::unshield(&state, &request.params).await,
        "pool_private_transfer" => {
            commands::pool::private_transfer(&state, &request.params).await
        }
        "pool_status" => commands::pool::status(&state).await,

        // Custodial ledger
        "ledger_credit" => commands::ledger::credit(&state, &request.params).await,
        "ledger_balance" => commands::ledger::balance(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
