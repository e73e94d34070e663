//! Custodial ledger command handlers.

use std::sync::Arc;

use serde_json::Value;

use crate::DaemonState;
use crate::commands::{hex32_param, u64_param};
use crate::rpc::RpcError;

type Result = std::result::Result<Value, RpcError>;

/// Credit a public account (faucet).
pub async fn credit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = hex32_param(params, "account")?;
    let amount = u64_param(params, "amount")?;

    let mut service = state.service.lock().await;
    let balance = service
        .credit(&account, amount)
        .map_err(RpcError::from_service)?;

    Ok(serde_json::json!({
        "account": hex::encode(account),
        "balance": balance,
    }))
}

/// Get an account's public and shielded balances.
pub async fn balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = hex32_param(params, "account")?;

    let service = state.service.lock().await;
    Ok(serde_json::json!({
        "account": hex::encode(account),
        "balance": service.balance(&account),
        "shielded": service.shielded_balance(&account),
    }))
}
