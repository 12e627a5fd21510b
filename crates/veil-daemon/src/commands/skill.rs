//! Skill read handlers.

use std::sync::Arc;

use serde_json::Value;
use veil_db::SqliteStore;

use super::{param_i64, param_limit, to_value, Result};
use crate::rpc::RpcError;
use crate::{clock, DaemonState};

/// Accuracy aggregate for one user.
pub async fn get_skill(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id = param_i64(params, "user_id")?;
    let db = state.db.lock().await;
    let stat = state
        .services
        .skills
        .stat(&SqliteStore::new(db.conn()), user_id)
        .map_err(RpcError::domain)?;
    to_value(&stat)
}

/// Top users by accuracy. Served from the ranking cache unless `fresh`.
pub async fn get_leaderboard(state: &Arc<DaemonState>, params: &Value) -> Result {
    let limit = param_limit(params, 10, 100);
    let fresh = params.get("fresh").and_then(|v| v.as_bool()).unwrap_or(false);

    let mut cache = state.ranking.lock().await;
    if fresh {
        cache.invalidate();
    }
    let db = state.db.lock().await;
    let board = state
        .services
        .skills
        .leaderboard(&SqliteStore::new(db.conn()), &mut cache, limit, clock::now())
        .map_err(RpcError::domain)?;
    to_value(&board)
}
