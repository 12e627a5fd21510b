//! Diagnostics command handlers.

use std::sync::Arc;

use tracing::info;

use super::Result;
use crate::DaemonState;

/// Version, effective settings and event counter.
pub async fn get_daemon_info(state: &Arc<DaemonState>) -> Result {
    let config = &state.config;
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": veil_db::SCHEMA_VERSION,
        "entry_cost": config.economy.entry_cost,
        "wrong_penalty": config.economy.wrong_penalty,
        "alpha": config.affinity.alpha,
        "beta": config.affinity.beta,
        "tiers": [config.tiers.t1, config.tiers.t2, config.tiers.t3],
        "max_starts_per_hour": config.quiz.max_starts_per_hour,
        "events_emitted": state.event_bus.sequence(),
    }))
}

/// Ask the daemon to stop after this response.
pub async fn shutdown(state: &Arc<DaemonState>) -> Result {
    info!("Shutdown requested over RPC");
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"shutting_down": true}))
}

/// Random hex id for an event subscription.
pub fn new_subscription_id() -> String {
    let mut sub_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut sub_id);
    hex::encode(sub_id)
}
