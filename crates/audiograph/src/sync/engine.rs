//! Per-stream synchronization engine.
//!
//! [`Synchronizer::sync`] performs exactly one page fetch for one
//! stream: guard acquisition, fetch from the tracked cursor,
//! stream-specific normalization, store merge, cursor advance. A page
//! is applied in full or not at all; on any failure the guard is
//! released and neither the store nor the cursor has moved.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::classify::{self, TrackRef};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::state::{Cursor, CursorTracker, StreamGuard};
use super::types::{FAVORITES_SWEEP_TEMPLATE, ResourceStream, SyncError, SyncReport};
use crate::api::{
    ApiClient, Normalized, RawActivity, RawTrack, RawUser, normalize_tracks, normalize_users,
};
use crate::entity::EntityId;
use crate::store::EntityStore;

/// Drives page fetches for the four resource streams.
///
/// Collaborators are shared behind `Arc`s, so clones see the same
/// store, cursors, and guards; the bulk sweep clones one per spawned
/// favorites task.
#[derive(Clone)]
pub struct Synchronizer {
    client: ApiClient,
    store: Arc<EntityStore>,
    cursors: Arc<CursorTracker>,
    guard: Arc<StreamGuard>,
    on_progress: Option<Arc<ProgressCallback>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Synchronizer {
    pub fn new(
        client: ApiClient,
        store: Arc<EntityStore>,
        cursors: Arc<CursorTracker>,
        guard: Arc<StreamGuard>,
    ) -> Self {
        Self {
            client,
            store,
            cursors,
            guard,
            on_progress: None,
            shutdown: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, on_progress: Arc<ProgressCallback>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Attach a cooperative shutdown flag. When set, the bulk sweep
    /// stops issuing further page fetches.
    #[must_use]
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[must_use]
    pub fn cursors(&self) -> &CursorTracker {
        &self.cursors
    }

    #[must_use]
    pub fn guard(&self) -> &StreamGuard {
        &self.guard
    }

    /// Whether the attached shutdown flag has been raised.
    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    pub(crate) fn progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_deref()
    }

    /// Sync one page of a stream.
    ///
    /// An exhausted cursor short-circuits to an empty report without
    /// touching the guard or the network; an explicit
    /// [`CursorTracker::reset`] starts the stream over. When another
    /// fetch for the stream is in flight and `override_guard` is
    /// false, returns [`SyncError::AlreadyInProgress`] without fetching
    /// or mutating anything.
    pub async fn sync(
        &self,
        stream: ResourceStream,
        user: Option<&str>,
        override_guard: bool,
    ) -> Result<SyncReport, SyncError> {
        let cursor = self.cursors.get(stream);
        if cursor.is_exhausted() {
            tracing::debug!(stream = %stream, "cursor exhausted, nothing to fetch");
            return Ok(SyncReport::exhausted(stream));
        }

        let Some(permit) = self.guard.try_acquire(stream, override_guard) else {
            emit(self.progress(), SyncProgress::FetchSkipped { stream });
            return Err(SyncError::AlreadyInProgress { stream });
        };

        emit(self.progress(), SyncProgress::FetchStarted { stream });
        let result = self.fetch_and_apply(stream, user, &cursor).await;
        drop(permit);
        emit(self.progress(), SyncProgress::FetchFinished { stream });
        result
    }

    /// Fetch, normalize, and apply one page. Runs with the stream
    /// permit held; every store/cursor mutation sits after the last
    /// fallible step.
    async fn fetch_and_apply(
        &self,
        stream: ResourceStream,
        user: Option<&str>,
        cursor: &Cursor,
    ) -> Result<SyncReport, SyncError> {
        let next_href = cursor.next_href();
        let template = stream.default_template();

        let (normalized, track_refs, fetched, next) = match stream {
            ResourceStream::Followings | ResourceStream::Followers => {
                let page = self
                    .client
                    .fetch_page::<RawUser>(user, next_href, template)
                    .await?;
                let fetched = page.items.len();
                (normalize_users(page.items)?, Vec::new(), fetched, page.next_href)
            }
            ResourceStream::Favorites => {
                let page = self
                    .client
                    .fetch_page::<RawTrack>(user, next_href, template)
                    .await?;
                let fetched = page.items.len();
                (normalize_tracks(page.items)?, Vec::new(), fetched, page.next_href)
            }
            ResourceStream::Activities => {
                let page = self
                    .client
                    .fetch_page::<RawActivity>(user, next_href, template)
                    .await?;
                let fetched = page.items.len();
                let refs = classify::track_refs(&page.items);
                let tracks = classify::origins(page.items);
                (normalize_tracks(tracks)?, refs, fetched, page.next_href)
            }
        };

        Ok(self.apply_page(stream, normalized, track_refs, fetched, next))
    }

    /// Infallible tail of a page sync: merge, advance cursor, report.
    fn apply_page(
        &self,
        stream: ResourceStream,
        normalized: Normalized,
        track_refs: Vec<TrackRef>,
        fetched: usize,
        next: Option<String>,
    ) -> SyncReport {
        let has_more = next.is_some();
        emit(
            self.progress(),
            SyncProgress::PageFetched {
                stream,
                items: fetched,
                has_more,
            },
        );

        let Normalized { ids, delta } = normalized;
        let merged = self.store.merge(delta);
        emit(
            self.progress(),
            SyncProgress::EntitiesMerged {
                stream,
                count: merged,
            },
        );

        let cursor = Cursor::from_next_href(next);
        self.cursors.set(stream, cursor.clone());
        emit(
            self.progress(),
            SyncProgress::CursorAdvanced {
                stream,
                next_href: cursor.next_href().map(ToString::to_string),
            },
        );

        tracing::debug!(stream = %stream, fetched, merged, has_more, "applied page");

        SyncReport {
            stream,
            ids,
            track_refs,
            cursor,
            fetched,
            merged,
        }
    }

    /// One-shot favorites fetch for a single following, used by the
    /// bulk sweep.
    ///
    /// Fetches one large page of the user's favorites and merges the
    /// tracks (and their uploaders). Deliberately unguarded and
    /// cursor-less: it neither competes with the favorites stream's
    /// guard nor moves its cursor.
    pub async fn fetch_favorites_of(&self, user_id: EntityId) -> Result<usize, SyncError> {
        let user = user_id.to_string();
        let page = self
            .client
            .fetch_page::<RawTrack>(Some(&user), None, FAVORITES_SWEEP_TEMPLATE)
            .await?;
        let normalized = normalize_tracks(page.items)?;
        let merged = self.store.merge(normalized.delta);
        tracing::debug!(user_id, merged, "merged favorites of following");
        Ok(merged)
    }
}
