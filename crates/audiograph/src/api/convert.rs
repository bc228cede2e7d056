//! Normalization of raw collection items into entity deltas.
//!
//! Raw payloads become canonical entities flattened into an
//! [`EntityDelta`]: a track arrives with its uploader embedded as a
//! full user object, which is extracted into its own user entity and
//! replaced by an ID reference on the track.

use serde::Serialize;
use serde::ser::Error as _;
use serde_json::Value;

use super::types::{RawTrack, RawUser};
use crate::entity::{EntityId, EntityKind, Track, User};
use crate::store::{EntityDelta, FieldMap};

/// Result of normalizing one page of raw items.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// IDs of the page's primary entities, in page order.
    pub ids: Vec<EntityId>,
    /// Every extracted entity, keyed by kind and ID.
    pub delta: EntityDelta,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        User {
            id: raw.id,
            username: raw.username,
            full_name: raw.full_name,
            avatar_url: raw.avatar_url,
            permalink_url: raw.permalink_url,
            city: raw.city,
            country: raw.country,
            followers_count: raw.followers_count,
            followings_count: raw.followings_count,
            track_count: raw.track_count,
        }
    }
}

/// Split a raw track into its canonical track and the extracted
/// uploader.
fn split_track(raw: RawTrack) -> (Track, Option<User>) {
    let uploader = raw.user.map(User::from);
    let track = Track {
        id: raw.id,
        title: raw.title,
        user: uploader.as_ref().map(|u| u.id),
        artwork_url: raw.artwork_url,
        permalink_url: raw.permalink_url,
        stream_url: raw.stream_url,
        genre: raw.genre,
        duration: raw.duration,
        playback_count: raw.playback_count,
        favoritings_count: raw.favoritings_count,
        created_at: raw.created_at,
    };
    (track, uploader)
}

fn to_field_map<T: Serialize>(entity: &T) -> Result<FieldMap, serde_json::Error> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(serde_json::Error::custom(format!(
            "entity serialized to {other}, expected an object"
        ))),
    }
}

/// Normalize a page of users.
pub fn normalize_users(raw: Vec<RawUser>) -> Result<Normalized, serde_json::Error> {
    let mut normalized = Normalized::default();
    for user in raw.into_iter().map(User::from) {
        normalized.ids.push(user.id);
        normalized
            .delta
            .insert(EntityKind::User, user.id, to_field_map(&user)?);
    }
    Ok(normalized)
}

/// Normalize a page of tracks, extracting embedded uploaders as user
/// entities.
pub fn normalize_tracks(raw: Vec<RawTrack>) -> Result<Normalized, serde_json::Error> {
    let mut normalized = Normalized::default();
    for raw_track in raw {
        let (track, uploader) = split_track(raw_track);
        normalized.ids.push(track.id);
        normalized
            .delta
            .insert(EntityKind::Track, track.id, to_field_map(&track)?);
        if let Some(user) = uploader {
            normalized
                .delta
                .insert(EntityKind::User, user.id, to_field_map(&user)?);
        }
    }
    Ok(normalized)
}
