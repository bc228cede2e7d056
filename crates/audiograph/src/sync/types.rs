//! Shared types and constants for the sync engine.

use thiserror::Error;

use crate::api::ApiError;
use crate::entity::EntityId;
use crate::sync::classify::TrackRef;
use crate::sync::state::Cursor;

/// Default number of concurrent favorites fetches during a bulk sweep.
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 8;

/// Initial backoff delay for transport retries, in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay for transport retries, in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Maximum number of transport retry attempts.
pub const MAX_TRANSPORT_RETRIES: u32 = 5;

/// Query template for the one-shot favorites fetch of a following.
///
/// A larger page than the direct favorites stream: the sweep reads one
/// page per following and moves on.
pub const FAVORITES_SWEEP_TEMPLATE: &str = "favorites?linked_partitioning=1&limit=200&offset=0";

/// The four independently paginated and guarded collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceStream {
    Followings,
    Followers,
    Favorites,
    Activities,
}

impl ResourceStream {
    /// All streams, in guard-slot order.
    pub const ALL: [ResourceStream; 4] = [
        ResourceStream::Followings,
        ResourceStream::Followers,
        ResourceStream::Favorites,
        ResourceStream::Activities,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStream::Followings => "followings",
            ResourceStream::Followers => "followers",
            ResourceStream::Favorites => "favorites",
            ResourceStream::Activities => "activities",
        }
    }

    /// First-page path and query for this stream.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            ResourceStream::Followings => "followings?limit=20&offset=0",
            ResourceStream::Followers => "followers?limit=20&offset=0",
            ResourceStream::Favorites => "favorites?linked_partitioning=1&limit=20&offset=0",
            ResourceStream::Activities => "activities?limit=20&offset=0",
        }
    }

    /// Stable index of this stream's guard and cursor slot.
    pub(crate) fn index(self) -> usize {
        match self {
            ResourceStream::Followings => 0,
            ResourceStream::Followers => 1,
            ResourceStream::Favorites => 2,
            ResourceStream::Activities => 3,
        }
    }
}

impl std::fmt::Display for ResourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "followings" => Ok(ResourceStream::Followings),
            "followers" => Ok(ResourceStream::Followers),
            "favorites" => Ok(ResourceStream::Favorites),
            "activities" => Ok(ResourceStream::Activities),
            other => Err(format!(
                "unknown stream '{other}' (expected followings, followers, favorites or activities)"
            )),
        }
    }
}

/// Errors surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A fetch for this stream is already in flight. A no-op signal,
    /// not a failure: nothing was fetched and nothing was mutated.
    #[error("sync already in progress for {stream}")]
    AlreadyInProgress { stream: ResourceStream },

    /// Transport failure or non-success API status.
    #[error("network error: {message}")]
    Network { message: String },

    /// Malformed or unexpected payload.
    #[error("decode error: {message}")]
    Decode { message: String },
}

impl SyncError {
    #[must_use]
    pub fn is_already_in_progress(&self) -> bool {
        matches!(self, SyncError::AlreadyInProgress { .. })
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Decode(e) => SyncError::Decode {
                message: e.to_string(),
            },
            other => SyncError::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode {
            message: err.to_string(),
        }
    }
}

/// Result of syncing one page of one stream.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Stream this page belongs to.
    pub stream: ResourceStream,
    /// IDs of the page's primary entities, in page order.
    pub ids: Vec<EntityId>,
    /// Track/repost index for the activities stream; empty elsewhere.
    pub track_refs: Vec<TrackRef>,
    /// Cursor state after applying this page.
    pub cursor: Cursor,
    /// Number of raw items the page carried.
    pub fetched: usize,
    /// Number of entities merged into the store.
    pub merged: usize,
}

impl SyncReport {
    /// Report for a stream whose cursor was already exhausted: nothing
    /// fetched, nothing merged.
    pub(crate) fn exhausted(stream: ResourceStream) -> Self {
        Self {
            stream,
            ids: Vec::new(),
            track_refs: Vec::new(),
            cursor: Cursor::Exhausted,
            fetched: 0,
            merged: 0,
        }
    }
}

/// Options for the bulk followings sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Maximum number of concurrent favorites fetches.
    pub concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
        }
    }
}

/// Result of a bulk followings sweep.
#[derive(Debug, Default)]
pub struct SweepSummary {
    /// Number of followings pages fetched.
    pub pages: usize,
    /// Distinct followings seen across all pages.
    pub followings: usize,
    /// Favorites fetches that completed successfully.
    pub favorites_fetched: usize,
    /// Entities merged by the favorites fetches (tracks and their
    /// uploaders).
    pub favorites_merged: usize,
    /// Per-following favorites failures. Best-effort: the sweep
    /// continues past these.
    pub errors: Vec<(EntityId, String)>,
    /// Whether the sweep stopped early because shutdown was requested.
    pub cancelled: bool,
}

impl SweepSummary {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
