//! Pool operation command handlers.

use std::sync::Arc;

use serde_json::Value;

use crate::DaemonState;
use crate::commands::{hex32_param, hex_param, u64_param};
use crate::rpc::RpcError;

type Result = std::result::Result<Value, RpcError>;

/// Initialize the pool under an authority.
pub async fn initialize(state: &Arc<DaemonState>, params: &Value) -> Result {
    let authority = hex32_param(params, "authority")?;

    let mut service = state.service.lock().await;
    let receipt = service
        .initialize(&authority)
        .map_err(RpcError::from_service)?;

    Ok(serde_json::json!({
        "authority": hex::encode(receipt.authority),
        "vault": hex::encode(receipt.vault),
    }))
}

/// Shield a deposit into the pool.
pub async fn shield(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = hex32_param(params, "caller")?;
    let amount = u64_param(params, "amount")?;
    let commitment = hex32_param(params, "commitment")?;

    let mut service = state.service.lock().await;
    let receipt = service
        .shield(&caller, amount, commitment)
        .map_err(RpcError::from_service)?;

    Ok(serde_json::json!({
        "commitment": hex::encode(receipt.commitment),
        "amount": receipt.amount,
        "leaf_index": receipt.leaf_index,
        "total_shielded": receipt.total_shielded,
        "caller_shielded": receipt.caller_shielded,
    }))
}

/// Unshield a note back to the caller's public balance.
pub async fn unshield(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = hex32_param(params, "caller")?;
    let amount = u64_param(params, "amount")?;
    let nullifier = hex32_param(params, "nullifier")?;
    let proof = hex_param(params, "proof")?;
    let public_inputs = hex_param(params, "public_inputs")?;

    let mut service = state.service.lock().await;
    let receipt = service
        .unshield(&caller, amount, nullifier, &proof, &public_inputs)
        .map_err(RpcError::from_service)?;

    Ok(serde_json::json!({
        "nullifier": hex::encode(receipt.nullifier),
        "amount": receipt.amount,
        "total_shielded": receipt.total_shielded,
        "total_public": receipt.total_public,
        "caller_shielded": receipt.caller_shielded,
    }))
}

/// Spend a note into a fresh commitment without leaving the pool.
pub async fn private_transfer(state: &Arc<DaemonState>, params: &Value) -> Result {
    let old_nullifier = hex32_param(params, "old_nullifier")?;
    let new_commitment = hex32_param(params, "new_commitment")?;
    let proof = hex_param(params, "proof")?;
    let public_inputs = hex_param(params, "public_inputs")?;

    let mut service = state.service.lock().await;
    let receipt = service
        .private_transfer(old_nullifier, new_commitment, &proof, &public_inputs)
        .map_err(RpcError::from_service)?;

    Ok(serde_json::json!({
        "old_nullifier": hex::encode(receipt.old_nullifier),
        "new_commitment": hex::encode(receipt.new_commitment),
        "leaf_index": receipt.leaf_index,
        "total_shielded": receipt.total_shielded,
    }))
}

/// Get pool status.
pub async fn status(state: &Arc<DaemonState>) -> Result {
    let service = state.service.lock().await;
    let status = service.status();

    Ok(serde_json::json!({
        "initialized": status.initialized,
        "halted": status.halted,
        "authority": status.authority.map(hex::encode),
        "vault": status.vault.map(hex::encode),
        "total_shielded": status.total_shielded,
        "total_public": status.total_public,
        "commitment_count": status.commitment_count,
        "nullifier_count": status.nullifier_count,
        "vault_balance": status.vault_balance,
        "verifier": state.config.pool.verifier,
    }))
}
