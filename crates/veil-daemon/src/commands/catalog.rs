//! Content ingestion handlers.
//!
//! Used by the quiz/content authority and the photo pipeline to publish
//! target preferences, photo moderation results and profile fields. These
//! rows are inputs to the disclosure engine; nothing here touches scores.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use veil_store::{StoreError, Transactional};
use veil_types::{Photo, ProfileField, TargetPreference};

use super::{param_as, Result};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Declare or replace a target's choice for one question.
pub async fn put_preference(state: &Arc<DaemonState>, params: &Value) -> Result {
    let preference: TargetPreference = param_as(params, "preference")?;
    let mut db = state.db.lock().await;
    db.atomically(|tx| tx.put_preference(&preference))
        .map_err(RpcError::domain::<StoreError>)?;
    debug!(
        target_id = preference.target_id,
        question_id = preference.question_id,
        "preference stored"
    );
    Ok(serde_json::json!({"stored": true}))
}

/// Insert or replace a photo with its moderation status and variant keys.
pub async fn put_photo(state: &Arc<DaemonState>, params: &Value) -> Result {
    let photo: Photo = param_as(params, "photo")?;
    let mut db = state.db.lock().await;
    db.atomically(|tx| tx.put_photo(&photo))
        .map_err(RpcError::domain::<StoreError>)?;
    debug!(photo_id = photo.id, status = photo.status.as_str(), "photo stored");
    Ok(serde_json::json!({"stored": true}))
}

/// Insert or replace one textual profile field.
pub async fn put_profile_field(state: &Arc<DaemonState>, params: &Value) -> Result {
    let field: ProfileField = param_as(params, "field")?;
    if field.name.trim().is_empty() {
        return Err(RpcError::invalid_params("field.name must not be empty"));
    }
    let mut db = state.db.lock().await;
    db.atomically(|tx| tx.put_profile_field(&field))
        .map_err(RpcError::domain::<StoreError>)?;
    Ok(serde_json::json!({"stored": true}))
}
