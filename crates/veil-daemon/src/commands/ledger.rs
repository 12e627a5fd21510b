//! Currency ledger command handlers.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use veil_db::SqliteStore;
use veil_store::Transactional;
use veil_types::Reason;

use super::{param_i64, param_limit, param_str, param_u64, to_value, Result};
use crate::rpc::RpcError;
use crate::{clock, DaemonState};

fn reason(params: &Value) -> std::result::Result<Reason, RpcError> {
    Reason::from_str(param_str(params, "reason")?).map_err(RpcError::domain)
}

/// Get a user's balance. Unknown users read as zero.
pub async fn get_balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let db = state.db.lock().await;
    let balance = state
        .services
        .ledger
        .balance(&SqliteStore::new(db.conn()), user_id)
        .map_err(RpcError::domain)?;
    to_value(&balance)
}

/// Credit a user's account.
pub async fn credit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let amount = param_u64(params, "amount")?;
    let reason = reason(params)?;
    let ref_id = params.get("ref_id").and_then(|v| v.as_str());
    let now = clock::now();

    let mut db = state.db.lock().await;
    let receipt = db
        .atomically(|tx| {
            state
                .services
                .ledger
                .credit(tx, user_id, amount, reason, ref_id, now)
        })
        .map_err(RpcError::domain)?;
    info!(user_id, amount, %reason, "credit applied");
    to_value(&receipt)
}

/// Debit a user's account. Fails without writing if funds are short.
pub async fn debit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let amount = param_u64(params, "amount")?;
    let reason = reason(params)?;
    let ref_id = params.get("ref_id").and_then(|v| v.as_str());
    let now = clock::now();

    let mut db = state.db.lock().await;
    let receipt = db
        .atomically(|tx| {
            state
                .services
                .ledger
                .debit(tx, user_id, amount, reason, ref_id, now)
        })
        .map_err(RpcError::domain)?;
    info!(user_id, amount, %reason, "debit applied");
    to_value(&receipt)
}

/// Most recent ledger entries, newest first.
pub async fn get_ledger_history(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let limit = param_limit(params, 50, 500);
    let db = state.db.lock().await;
    let entries = state
        .services
        .ledger
        .history(&SqliteStore::new(db.conn()), user_id, limit)
        .map_err(RpcError::domain)?;
    to_value(&entries)
}

/// Replay a user's entries against the stored balance.
pub async fn audit_account(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let db = state.db.lock().await;
    let report = state
        .services
        .ledger
        .audit(&SqliteStore::new(db.conn()), user_id)
        .map_err(RpcError::domain)?;
    to_value(&report)
}
