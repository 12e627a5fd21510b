//! Answer submission and disclosure read handlers.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use veil_db::SqliteStore;
use veil_store::Transactional;
use veil_types::Choice;

use super::{param_i64, param_str, to_value, Result};
use crate::events::Event;
use crate::rpc::RpcError;
use crate::{clock, DaemonState};

/// Resolve one guess. Emits tier events after the answer commits.
pub async fn submit_answer(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session_id = param_i64(params, "session_id")?;
    let question_id = param_i64(params, "question_id")?;
    let guess = Choice::from_str(param_str(params, "guess")?).map_err(RpcError::domain)?;
    let now = clock::now();

    let outcome = {
        let mut db = state.db.lock().await;
        db.atomically(|tx| {
            state
                .services
                .disclosure
                .submit_answer_in(tx, session_id, question_id, guess, now)
        })
        .map_err(RpcError::domain)?
    };

    state.event_bus.emit_all(Event::from_answer(&outcome, now));
    to_value(&outcome)
}

/// Answers recorded for a session.
pub async fn get_answers(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session_id = param_i64(params, "session_id")?;
    let db = state.db.lock().await;
    let answers = state
        .services
        .disclosure
        .answers(&SqliteStore::new(db.conn()), session_id)
        .map_err(RpcError::domain)?;
    to_value(&answers)
}

/// Affinity of viewer towards target.
pub async fn get_affinity(state: &Arc<DaemonState>, params: &Value) -> Result {
    let viewer_id = param_i64(params, "viewer_id")?;
    let target_id = param_i64(params, "target_id")?;
    let db = state.db.lock().await;
    let score = state
        .services
        .disclosure
        .scorer()
        .score(&SqliteStore::new(db.conn()), viewer_id, target_id)
        .map_err(RpcError::domain)?;
    to_value(&score)
}

/// Target's approved photos with the variants the viewer has unlocked.
pub async fn get_gallery(state: &Arc<DaemonState>, params: &Value) -> Result {
    let viewer_id = param_i64(params, "viewer_id")?;
    let target_id = param_i64(params, "target_id")?;
    let db = state.db.lock().await;
    let gallery = state
        .services
        .disclosure
        .gate()
        .gallery(&SqliteStore::new(db.conn()), viewer_id, target_id)
        .map_err(RpcError::domain)?;
    to_value(&gallery)
}

/// Target's profile fields readable at the viewer's live score.
pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let viewer_id = param_i64(params, "viewer_id")?;
    let target_id = param_i64(params, "target_id")?;
    let db = state.db.lock().await;
    let view = state
        .services
        .disclosure
        .scorer()
        .disclose_profile(&SqliteStore::new(db.conn()), viewer_id, target_id)
        .map_err(RpcError::domain)?;
    to_value(&view)
}
