//! Disclosure storage traits.

use veil_types::{AffinityScore, Photo, PhotoId, ProfileField, UserId, VisibilityState};

use crate::Result;

/// Photos, as published by the external photo pipeline.
pub trait PhotoRepo {
    /// Insert or replace a photo and its variant keys.
    fn put_photo(&mut self, photo: &Photo) -> Result<()>;

    /// Approved photos owned by `owner_id`, ascending by id.
    fn approved_photos(&self, owner_id: UserId) -> Result<Vec<Photo>>;
}

/// Textual profile fields.
pub trait ProfileRepo {
    /// Insert or replace the field `(user_id, group, name)`.
    fn put_profile_field(&mut self, field: &ProfileField) -> Result<()>;

    /// Every field of a user, ordered by group then name.
    fn profile_fields(&self, user_id: UserId) -> Result<Vec<ProfileField>>;
}

/// Per-pair affinity rows.
pub trait AffinityRepo {
    fn affinity(&self, viewer_id: UserId, target_id: UserId) -> Result<Option<AffinityScore>>;

    fn put_affinity(&mut self, score: &AffinityScore) -> Result<()>;
}

/// Per-(viewer, photo) visibility rows.
pub trait VisibilityRepo {
    fn visibility(&self, viewer_id: UserId, photo_id: PhotoId)
        -> Result<Option<VisibilityState>>;

    fn put_visibility(&mut self, state: &VisibilityState) -> Result<()>;
}
