//! Collection API layer.
//!
//! Everything that touches the wire lives here: the client that builds
//! page URLs and performs requests, the deserialize structs for the
//! page envelope and its items, the API error taxonomy, and the
//! normalization step that turns raw items into entity deltas.
//!
//! # Module Structure
//!
//! - [`client`] - Page URL construction and page fetching
//! - [`types`] - Wire data structures
//! - [`error`] - Error types for API operations
//! - [`convert`] - Normalization into entity deltas

mod client;
mod convert;
mod error;
mod types;

pub use client::{ApiClient, DEFAULT_HOST};
pub use convert::{Normalized, normalize_tracks, normalize_users};
pub use error::{ApiError, is_retryable_status, short_error_message};
pub use types::{FetchedPage, PageEnvelope, RawActivity, RawTrack, RawUser};
