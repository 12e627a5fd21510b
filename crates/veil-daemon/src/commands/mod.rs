//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! that write run their component call inside `Database::atomically` while
//! holding the database lock, and emit events only after it returns `Ok`.

pub mod catalog;
pub mod diagnostics;
pub mod disclosure;
pub mod ledger;
pub mod quiz;
pub mod skill;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::rpc::RpcError;

pub(crate) type Result = std::result::Result<Value, RpcError>;

/// Required integer parameter.
pub(crate) fn param_i64(params: &Value, name: &str) -> std::result::Result<i64, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Required non-negative integer parameter.
pub(crate) fn param_u64(params: &Value, name: &str) -> std::result::Result<u64, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Required string parameter.
pub(crate) fn param_str<'a>(params: &'a Value, name: &str) -> std::result::Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Parameter deserialized into a typed value.
pub(crate) fn param_as<T: DeserializeOwned>(
    params: &Value,
    name: &str,
) -> std::result::Result<T, RpcError> {
    let raw = params
        .get(name)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))?;
    serde_json::from_value(raw.clone())
        .map_err(|e| RpcError::invalid_params(&format!("{name}: {e}")))
}

/// Optional limit parameter, capped.
pub(crate) fn param_limit(params: &Value, default: usize, max: usize) -> usize {
    params
        .get("limit")
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
        .min(max)
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode: {e}")))
}
