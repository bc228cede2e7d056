//! Paginated synchronization of the social collections.
//!
//! This module drives the four resource streams (followings, followers,
//! favorites, activities) page by page into the shared [`EntityStore`],
//! with per-stream cursors and in-flight guards.
//!
//! # Module Structure
//!
//! - [`types`] - Core types: `ResourceStream`, `SyncReport`, `SyncError`, constants
//! - [`state`] - Pagination state: `Cursor`, `CursorTracker`, `StreamGuard`
//! - [`classify`] - Activity item classification: `ActivityKind`, `TrackRef`
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - The per-page [`Synchronizer`]
//! - [`sweep`] - Bulk followings sweep: [`sweep_followings`]
//!
//! # Example
//!
//! ```ignore
//! use audiograph::sync::{ResourceStream, Synchronizer, SweepOptions, sweep_followings};
//!
//! async fn run(sync: &Synchronizer) -> Result<(), audiograph::sync::SyncError> {
//!     let report = sync.sync(ResourceStream::Followings, None, false).await?;
//!     println!("merged {} entities", report.merged);
//!
//!     let summary = sweep_followings(sync, None, &SweepOptions::default()).await?;
//!     println!("swept {} followings", summary.followings);
//!     Ok(())
//! }
//! ```
//!
//! [`EntityStore`]: crate::store::EntityStore

mod classify;
mod engine;
mod progress;
mod state;
mod sweep;
mod types;

// Re-export types
pub use types::{ResourceStream, SweepOptions, SweepSummary, SyncError, SyncReport};

// Re-export constants
pub use types::{
    DEFAULT_SWEEP_CONCURRENCY, FAVORITES_SWEEP_TEMPLATE, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS,
    MAX_TRANSPORT_RETRIES,
};

// Re-export pagination state
pub use state::{Cursor, CursorTracker, StreamGuard, StreamPermit};

// Re-export classification types
pub use classify::{ActivityKind, TrackRef, classify, track_refs};

// Re-export progress types
pub use progress::{ProgressCallback, SyncProgress, emit};

// Re-export the engine and the sweep
pub use engine::Synchronizer;
pub use sweep::sweep_followings;
