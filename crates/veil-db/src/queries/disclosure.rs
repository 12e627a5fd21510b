//! Photo, profile, affinity and visibility query functions.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{Connection, OptionalExtension};
use veil_types::{
    AffinityScore, Photo, PhotoId, PhotoStatus, PhotoVariant, ProfileField, Tier, UserId,
    VisibilityState,
};

use super::{parse_label, sql_int};
use crate::{DbError, Result};

/// Insert or replace a photo and its variant keys.
pub fn upsert_photo(conn: &Connection, photo: &Photo) -> Result<()> {
    conn.execute(
        "INSERT INTO photos (id, owner_id, status) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, status = excluded.status",
        rusqlite::params![photo.id, photo.owner_id, photo.status.as_str()],
    )?;
    conn.execute("DELETE FROM photo_variants WHERE photo_id = ?1", [photo.id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO photo_variants (photo_id, variant, storage_key) VALUES (?1, ?2, ?3)",
    )?;
    for (variant, key) in &photo.variant_keys {
        stmt.execute(rusqlite::params![photo.id, variant.as_str(), key])?;
    }
    Ok(())
}

fn variant_keys(conn: &Connection, photo_id: PhotoId) -> Result<BTreeMap<PhotoVariant, String>> {
    let mut stmt =
        conn.prepare("SELECT variant, storage_key FROM photo_variants WHERE photo_id = ?1")?;
    let rows = stmt
        .query_map([photo_id], |row| {
            Ok((parse_label::<PhotoVariant>(0, row.get(0)?)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    Ok(rows)
}

/// Approved photos of an owner, ascending by id.
pub fn approved_photos(conn: &Connection, owner_id: UserId) -> Result<Vec<Photo>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM photos WHERE owner_id = ?1 AND status = 'APPROVED' ORDER BY id ASC",
    )?;
    let ids = stmt
        .query_map([owner_id], |row| row.get::<_, PhotoId>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut photos = Vec::with_capacity(ids.len());
    for id in ids {
        photos.push(Photo {
            id,
            owner_id,
            status: PhotoStatus::Approved,
            variant_keys: variant_keys(conn, id)?,
        });
    }
    Ok(photos)
}

/// Insert or replace one profile field.
pub fn upsert_profile_field(conn: &Connection, field: &ProfileField) -> Result<()> {
    conn.execute(
        "INSERT INTO profile_fields (user_id, field_group, name, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, field_group, name) DO UPDATE SET value = excluded.value",
        rusqlite::params![field.user_id, field.group.as_str(), field.name, field.value],
    )?;
    Ok(())
}

/// Every profile field of a user, ordered by group then name.
pub fn profile_fields(conn: &Connection, user_id: UserId) -> Result<Vec<ProfileField>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, field_group, name, value FROM profile_fields WHERE user_id = ?1",
    )?;
    let mut rows = stmt
        .query_map([user_id], |row| {
            Ok(ProfileField {
                user_id: row.get(0)?,
                group: parse_label(1, row.get(1)?)?,
                name: row.get(2)?,
                value: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    // Group order is the enum order, not the label's alphabetical order.
    rows.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));
    Ok(rows)
}

/// Get the affinity row for a pair.
pub fn affinity(
    conn: &Connection,
    viewer_id: UserId,
    target_id: UserId,
) -> Result<Option<AffinityScore>> {
    let row = conn
        .query_row(
            "SELECT score, stages_unlocked, last_interaction_at
             FROM affinity_scores WHERE viewer_id = ?1 AND target_id = ?2",
            rusqlite::params![viewer_id, target_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u64,
                ))
            },
        )
        .optional()?;

    let Some((score, stages_json, last_interaction_at)) = row else {
        return Ok(None);
    };
    let stages_unlocked: BTreeSet<Tier> = serde_json::from_str(&stages_json)
        .map_err(|e| DbError::Serialization(format!("stages_unlocked: {e}")))?;

    Ok(Some(AffinityScore {
        viewer_id,
        target_id,
        score,
        stages_unlocked,
        last_interaction_at,
    }))
}

/// Insert or update the affinity row for a pair.
pub fn upsert_affinity(conn: &Connection, score: &AffinityScore) -> Result<()> {
    let stages_json = serde_json::to_string(&score.stages_unlocked)
        .map_err(|e| DbError::Serialization(format!("stages_unlocked: {e}")))?;
    conn.execute(
        "INSERT INTO affinity_scores (viewer_id, target_id, score, stages_unlocked, last_interaction_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(viewer_id, target_id) DO UPDATE SET
            score = excluded.score,
            stages_unlocked = excluded.stages_unlocked,
            last_interaction_at = excluded.last_interaction_at",
        rusqlite::params![
            score.viewer_id,
            score.target_id,
            sql_int(score.score)?,
            stages_json,
            sql_int(score.last_interaction_at)?,
        ],
    )?;
    Ok(())
}

/// Get the stored tier of a photo for a viewer.
pub fn visibility(
    conn: &Connection,
    viewer_id: UserId,
    photo_id: PhotoId,
) -> Result<Option<VisibilityState>> {
    let row = conn
        .query_row(
            "SELECT tier, updated_at FROM visibility_states WHERE viewer_id = ?1 AND photo_id = ?2",
            rusqlite::params![viewer_id, photo_id],
            |row| {
                Ok(VisibilityState {
                    viewer_id,
                    photo_id,
                    tier: parse_label(0, row.get(0)?)?,
                    updated_at: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Insert or update a visibility row. The schema trigger rejects regressions.
pub fn upsert_visibility(conn: &Connection, state: &VisibilityState) -> Result<()> {
    conn.execute(
        "INSERT INTO visibility_states (viewer_id, photo_id, tier, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(viewer_id, photo_id) DO UPDATE SET
            tier = excluded.tier,
            updated_at = excluded.updated_at",
        rusqlite::params![
            state.viewer_id,
            state.photo_id,
            state.tier.as_str(),
            sql_int(state.updated_at)?,
        ],
    )?;
    Ok(())
}
