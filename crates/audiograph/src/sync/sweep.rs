//! Bulk followings sweep.
//!
//! Pages the followings stream to exhaustion and prefetches one page
//! of favorites for every following seen, with bounded concurrency.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::engine::Synchronizer;
use super::progress::{SyncProgress, emit};
use super::types::{ResourceStream, SweepOptions, SweepSummary, SyncError};
use crate::entity::EntityId;

type FavoritesHandle = JoinHandle<(EntityId, Result<usize, SyncError>)>;

/// Walk the followings graph and prefetch favorites for each following.
///
/// Fetches followings pages in a loop (bypassing the stream guard: the
/// sweep owns the stream for its duration) until the cursor is
/// exhausted. Every following not seen earlier in the sweep gets one
/// spawned favorites fetch, limited by a semaphore sized from
/// [`SweepOptions::concurrency`]. Favorites failures are recorded in
/// the summary and do not stop the sweep; a followings page failure is
/// fatal and surfaces after the already-spawned fetches have settled.
///
/// A raised shutdown flag (see [`Synchronizer::with_shutdown_flag`])
/// stops the pagination loop before the next page; fetches already
/// spawned run to completion and are counted in the summary.
pub async fn sweep_followings(
    sync: &Synchronizer,
    user: Option<&str>,
    options: &SweepOptions,
) -> Result<SweepSummary, SyncError> {
    let concurrency = std::cmp::max(1, options.concurrency);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    emit(sync.progress(), SyncProgress::SweepStarted);

    let mut summary = SweepSummary::default();
    let mut processed: HashSet<EntityId> = HashSet::new();
    let mut handles: Vec<(EntityId, FavoritesHandle)> = Vec::new();

    loop {
        if sync.shutdown_requested() {
            tracing::info!("shutdown requested, stopping sweep");
            summary.cancelled = true;
            break;
        }

        let report = match sync.sync(ResourceStream::Followings, user, true).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    pending = handles.len(),
                    "followings page failed, settling spawned favorites fetches"
                );
                drain(&mut handles, &mut summary).await;
                return Err(e);
            }
        };

        summary.pages += 1;
        let mut new_followings = 0usize;
        for &id in &report.ids {
            if processed.insert(id) {
                new_followings += 1;
                emit(
                    sync.progress(),
                    SyncProgress::FavoritesScheduled { user_id: id },
                );
                handles.push((id, spawn_favorites_fetch(sync.clone(), id, &semaphore)));
            }
        }
        emit(
            sync.progress(),
            SyncProgress::SweepPage {
                page: summary.pages,
                new_followings,
            },
        );

        if report.cursor.is_exhausted() {
            break;
        }
    }

    drain(&mut handles, &mut summary).await;
    summary.followings = processed.len();

    emit(
        sync.progress(),
        SyncProgress::SweepFinished {
            pages: summary.pages,
            followings: summary.followings,
            favorites_fetched: summary.favorites_fetched,
            errors: summary.errors.len(),
            cancelled: summary.cancelled,
        },
    );

    Ok(summary)
}

fn spawn_favorites_fetch(
    sync: Synchronizer,
    user_id: EntityId,
    semaphore: &Arc<Semaphore>,
) -> FavoritesHandle {
    let semaphore = Arc::clone(semaphore);

    tokio::spawn(async move {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return (
                    user_id,
                    Err(SyncError::Network {
                        message: "favorites semaphore closed unexpectedly".to_string(),
                    }),
                );
            }
        };

        let result = sync.fetch_favorites_of(user_id).await;
        match &result {
            Ok(merged) => emit(
                sync.progress(),
                SyncProgress::FavoritesFetched {
                    user_id,
                    merged: *merged,
                },
            ),
            Err(e) => emit(
                sync.progress(),
                SyncProgress::FavoritesError {
                    user_id,
                    message: e.to_string(),
                },
            ),
        }

        (user_id, result)
    })
}

/// Await every spawned favorites fetch and fold the results into the
/// summary.
async fn drain(
    handles: &mut Vec<(EntityId, FavoritesHandle)>,
    summary: &mut SweepSummary,
) {
    for (user_id, handle) in handles.drain(..) {
        match handle.await {
            Ok((_, Ok(merged))) => {
                summary.favorites_fetched += 1;
                summary.favorites_merged += merged;
            }
            Ok((user_id, Err(e))) => {
                summary.errors.push((user_id, e.to_string()));
            }
            Err(e) => {
                summary.errors.push((user_id, format!("Task panic: {}", e)));
            }
        }
    }
}
