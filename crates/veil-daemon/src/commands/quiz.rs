//! Quiz session command handlers.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use veil_db::SqliteStore;
use veil_store::Transactional;
use veil_types::QuizMode;

use super::{param_i64, to_value, Result};
use crate::events::Event;
use crate::rpc::RpcError;
use crate::{clock, DaemonState};

/// Open a paid session. `mode` defaults to `standard`.
pub async fn start_quiz(state: &Arc<DaemonState>, params: &Value) -> Result {
    let asker_id = param_i64(params, "asker_id")?;
    let target_id = param_i64(params, "target_id")?;
    let mode = match params.get("mode").and_then(|v| v.as_str()) {
        Some(raw) => QuizMode::from_str(raw).map_err(RpcError::domain)?,
        None => QuizMode::default(),
    };
    let now = clock::now();

    let start = {
        let mut db = state.db.lock().await;
        db.atomically(|tx| {
            state
                .services
                .quiz
                .start_in(tx, asker_id, target_id, mode, now)
        })
        .map_err(RpcError::domain)?
    };

    state.event_bus.emit(Event::session_started(&start.session));
    to_value(&start)
}

/// Close a session. Repeated calls return the original end time.
pub async fn end_quiz(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session_id = param_i64(params, "session_id")?;
    let now = clock::now();

    let (session, newly_ended) = {
        let mut db = state.db.lock().await;
        db.atomically(|tx| {
            let quiz = &state.services.quiz;
            let was_ended = quiz.session(tx, session_id)?.is_ended();
            let session = quiz.end_in(tx, session_id, now)?;
            Ok::<_, veil_quiz::QuizError>((session, !was_ended))
        })
        .map_err(RpcError::domain)?
    };

    if newly_ended {
        state.event_bus.emit(Event::session_ended(&session, now));
    }
    to_value(&session)
}

/// Look up a session by id.
pub async fn get_session(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session_id = param_i64(params, "session_id")?;
    let db = state.db.lock().await;
    let session = state
        .services
        .quiz
        .session(&SqliteStore::new(db.conn()), session_id)
        .map_err(RpcError::domain)?;
    to_value(&session)
}
