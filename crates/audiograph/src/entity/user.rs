//! Canonical user entity.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// A user as stored after normalization.
///
/// Optional fields are skipped during serialization when absent, so
/// merging a sparse payload over an existing entity overlays only the
/// fields the payload actually carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Remote user ID.
    pub id: EntityId,
    /// Login/display name.
    pub username: String,
    /// Full name, if set on the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Public profile URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
    /// Profile city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Profile country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Number of followers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,
    /// Number of users this user follows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followings_count: Option<u64>,
    /// Number of uploaded tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u64>,
}
