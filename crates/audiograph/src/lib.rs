//! Audiograph - a paginated social-graph mirror for an audio platform.
//!
//! This library syncs a listener's social collections (followings,
//! followers, favorites, activities) from the platform's cursor-paged
//! API into a normalized, de-duplicated in-memory entity store.
//!
//! # Features
//!
//! - `reqwest` *(default)* - Enables the reqwest-backed HTTP transport
//!   and [`ApiClient::new`]. Without it, construct a client over your
//!   own [`HttpTransport`] with [`ApiClient::with_transport`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use audiograph::store::EntityStore;
//! use audiograph::sync::{
//!     CursorTracker, ResourceStream, StreamGuard, SweepOptions, Synchronizer, sweep_followings,
//! };
//! use audiograph::ApiClient;
//!
//! let client = ApiClient::new("https://api.soundcloud.com", None)?;
//! let sync = Synchronizer::new(
//!     client,
//!     Arc::new(EntityStore::new()),
//!     Arc::new(CursorTracker::new()),
//!     Arc::new(StreamGuard::new()),
//! );
//!
//! // One page of the followings stream.
//! let report = sync.sync(ResourceStream::Followings, None, false).await?;
//!
//! // Or sweep the whole graph, prefetching each following's favorites.
//! let summary = sweep_followings(&sync, None, &SweepOptions::default()).await?;
//! println!("{} followings, {} entities merged", summary.followings, summary.favorites_merged);
//! ```

pub mod api;
pub mod entity;
pub mod http;
pub mod retry;
pub mod store;
pub mod sync;

pub use api::{ApiClient, ApiError, DEFAULT_HOST};
pub use entity::{EntityId, EntityKind, Track, User};
pub use http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
pub use retry::{RetryConfig, RetryingTransport};
pub use store::{EntityDelta, EntityStore};
pub use sync::{
    Cursor, CursorTracker, ProgressCallback, ResourceStream, StreamGuard, SweepOptions,
    SweepSummary, SyncError, SyncProgress, SyncReport, Synchronizer, sweep_followings,
};
