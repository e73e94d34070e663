//! IPC command handlers.
//!
//! Each submodule implements the commands for one method family.

pub mod ledger;
pub mod pool;

use serde_json::Value;

use crate::rpc::RpcError;

/// Extract a hex-encoded 32-byte parameter.
pub(crate) fn hex32_param(params: &Value, field: &str) -> Result<[u8; 32], RpcError> {
    let text = params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    let bytes = hex::decode(text)
        .map_err(|_| RpcError::invalid_params(&format!("{field} must be hex")))?;
    bytes
        .try_into()
        .map_err(|_| RpcError::invalid_params(&format!("{field} must be 32 bytes")))
}

/// Extract a hex-encoded byte-string parameter.
pub(crate) fn hex_param(params: &Value, field: &str) -> Result<Vec<u8>, RpcError> {
    let text = params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))?;
    hex::decode(text).map_err(|_| RpcError::invalid_params(&format!("{field} must be hex")))
}

/// Extract an unsigned integer parameter.
pub(crate) fn u64_param(params: &Value, field: &str) -> Result<u64, RpcError> {
    params
        .get(field)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))
}
