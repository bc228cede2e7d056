//! Collection API data types.
//!
//! These structs deserialize responses from the paginated collection
//! endpoints. Only the fields the engine needs are declared, which
//! keeps decoding resilient to additions on the remote side.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Wire shape every paginated endpoint returns.
///
/// `next_href` is the complete URL of the following page, or absent on
/// the final page.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PageEnvelope<T> {
    /// Items of this page, in server order.
    #[serde(default)]
    pub collection: Vec<T>,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next_href: Option<String>,
}

/// One decoded page, as handed to the sync engine.
#[derive(Debug, Clone)]
pub struct FetchedPage<T> {
    /// Raw items of this page, in server order.
    pub items: Vec<T>,
    /// Continuation URL for the next page, if any.
    pub next_href: Option<String>,
}

impl<T> From<PageEnvelope<T>> for FetchedPage<T> {
    fn from(envelope: PageEnvelope<T>) -> Self {
        Self {
            items: envelope.collection,
            next_href: envelope.next_href,
        }
    }
}

/// A user as returned by the followings/followers endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    /// User ID.
    pub id: u64,
    /// Login/display name.
    #[serde(default)]
    pub username: String,
    /// Full name, if set.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Public profile URL.
    #[serde(default)]
    pub permalink_url: Option<String>,
    /// Profile city.
    #[serde(default)]
    pub city: Option<String>,
    /// Profile country.
    #[serde(default)]
    pub country: Option<String>,
    /// Number of followers.
    #[serde(default)]
    pub followers_count: Option<u64>,
    /// Number of followed users.
    #[serde(default)]
    pub followings_count: Option<u64>,
    /// Number of uploaded tracks.
    #[serde(default)]
    pub track_count: Option<u64>,
}

/// A track as returned by the favorites endpoint and inside activity
/// items.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrack {
    /// Track ID.
    pub id: u64,
    /// Track title.
    #[serde(default)]
    pub title: String,
    /// Uploader, embedded as a full user object.
    #[serde(default)]
    pub user: Option<RawUser>,
    /// Cover artwork URL.
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// Public track page URL.
    #[serde(default)]
    pub permalink_url: Option<String>,
    /// Streaming endpoint URL.
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Genre label.
    #[serde(default)]
    pub genre: Option<String>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Total play count.
    #[serde(default)]
    pub playback_count: Option<u64>,
    /// Number of favoriting users.
    #[serde(default)]
    pub favoritings_count: Option<u64>,
    /// Upload timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An item of the activities stream.
///
/// The stream is heterogeneous: the `type` discriminant decides whether
/// the item wraps a playable track (`origin`) or something the engine
/// does not process.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActivity {
    /// Item discriminant, e.g. `"track"` or `"track-repost"`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Wrapped track for track-kind items.
    #[serde(default)]
    pub origin: Option<RawTrack>,
    /// When the activity happened.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
