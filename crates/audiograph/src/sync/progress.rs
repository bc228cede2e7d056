//! Progress events emitted by the sync engine.
//!
//! Every state transition the engine performs is visible as an event:
//! callers wire a [`ProgressCallback`] to drive terminal output,
//! logging, or an external store, without the engine knowing which.

use super::types::ResourceStream;
use crate::entity::EntityId;

/// Progress events emitted during sync and sweep operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A page fetch for a stream began (the guard was acquired).
    FetchStarted {
        /// Stream being fetched.
        stream: ResourceStream,
    },
    /// A sync call was skipped because a fetch for the stream was
    /// already in flight.
    FetchSkipped {
        /// Stream whose guard rejected the call.
        stream: ResourceStream,
    },
    /// One page was fetched and decoded.
    PageFetched {
        /// Stream the page belongs to.
        stream: ResourceStream,
        /// Number of raw items on the page.
        items: usize,
        /// Whether the response announced a further page.
        has_more: bool,
    },
    /// Normalized entities were merged into the store.
    EntitiesMerged {
        /// Stream that produced the entities.
        stream: ResourceStream,
        /// Number of entries applied to the store.
        count: usize,
    },
    /// The stream's cursor moved to the next page (or exhausted).
    CursorAdvanced {
        /// Stream whose cursor moved.
        stream: ResourceStream,
        /// Continuation URL, absent when the stream is exhausted.
        next_href: Option<String>,
    },
    /// The fetch for a stream finished and its guard was released.
    /// Emitted on success and on failure.
    FetchFinished {
        /// Stream that finished.
        stream: ResourceStream,
    },
    /// A transport-layer retry is about to sleep before the next
    /// attempt.
    TransportRetry {
        /// 1-based attempt number that just failed.
        attempt: u32,
        /// Sleep before the next attempt, in milliseconds.
        delay_ms: u64,
        /// Short description of the failure.
        error: String,
    },
    /// A bulk followings sweep began.
    SweepStarted,
    /// One followings page was processed by the sweep.
    SweepPage {
        /// 1-based page number.
        page: usize,
        /// Followings on this page not seen earlier in the sweep.
        new_followings: usize,
    },
    /// A one-shot favorites fetch was scheduled for a following.
    FavoritesScheduled {
        /// The following's user ID.
        user_id: EntityId,
    },
    /// A one-shot favorites fetch completed.
    FavoritesFetched {
        /// The following's user ID.
        user_id: EntityId,
        /// Number of entities the fetch merged.
        merged: usize,
    },
    /// A one-shot favorites fetch failed. The sweep continues.
    FavoritesError {
        /// The following's user ID.
        user_id: EntityId,
        /// Short description of the failure.
        message: String,
    },
    /// The bulk sweep finished.
    SweepFinished {
        /// Followings pages fetched.
        pages: usize,
        /// Distinct followings seen.
        followings: usize,
        /// Favorites fetches that completed.
        favorites_fetched: usize,
        /// Favorites fetches that failed.
        errors: usize,
        /// Whether the sweep stopped early on shutdown.
        cancelled: bool,
    },
    /// Something non-fatal that deserves attention.
    Warning {
        /// Description of the condition.
        message: String,
    },
}

/// Callback invoked with progress events.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Invoke the callback if one is set.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(callback) = on_progress {
        callback(event);
    }
}
