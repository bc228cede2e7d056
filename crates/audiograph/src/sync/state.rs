//! Pagination cursors and per-stream in-flight guards.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::ResourceStream;

/// Pagination position of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cursor {
    /// Never fetched; the first page is built from the default
    /// template.
    #[default]
    Unset,
    /// Continuation URL of the next page, stored verbatim as the
    /// server issued it.
    Next(String),
    /// The final page was fetched; there are no further pages.
    Exhausted,
}

impl Cursor {
    /// Cursor from a page response's `next_href`.
    #[must_use]
    pub fn from_next_href(next_href: Option<String>) -> Self {
        match next_href {
            Some(href) => Cursor::Next(href),
            None => Cursor::Exhausted,
        }
    }

    /// Continuation URL, if one is pending.
    #[must_use]
    pub fn next_href(&self) -> Option<&str> {
        match self {
            Cursor::Next(href) => Some(href),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Cursor::Exhausted)
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Cursor::Unset)
    }
}

/// Pagination cursor of every stream.
///
/// Cursor contents are opaque continuation handles; nothing validates
/// them beyond passing them back to the API on the next fetch.
#[derive(Debug, Default)]
pub struct CursorTracker {
    cursors: Mutex<HashMap<ResourceStream, Cursor>>,
}

impl CursorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor of a stream. `Unset` when never touched.
    #[must_use]
    pub fn get(&self, stream: ResourceStream) -> Cursor {
        self.lock().get(&stream).cloned().unwrap_or_default()
    }

    pub fn set(&self, stream: ResourceStream, cursor: Cursor) {
        self.lock().insert(stream, cursor);
    }

    /// Forget a stream's position so the next sync starts from the
    /// first page again.
    pub fn reset(&self, stream: ResourceStream) {
        self.lock().insert(stream, Cursor::Unset);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ResourceStream, Cursor>> {
        self.cursors.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Per-stream in-flight flags.
///
/// [`StreamGuard::try_acquire`] hands out a [`StreamPermit`] whose
/// `Drop` clears the flag, so release happens exactly once on every
/// exit path.
#[derive(Debug, Default)]
pub struct StreamGuard {
    in_flight: [AtomicBool; ResourceStream::ALL.len()],
}

impl StreamGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a stream as in flight.
    ///
    /// Returns `None` when the stream is already in flight and
    /// `allow_reentrant` is false. With `allow_reentrant` the flag is
    /// set unconditionally; internally chained calls use this to fetch
    /// while a flag they manage themselves is up.
    #[must_use]
    pub fn try_acquire(
        &self,
        stream: ResourceStream,
        allow_reentrant: bool,
    ) -> Option<StreamPermit<'_>> {
        let flag = &self.in_flight[stream.index()];
        if allow_reentrant {
            flag.store(true, Ordering::Release);
            return Some(StreamPermit {
                guard: self,
                stream,
            });
        }
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(StreamPermit {
                guard: self,
                stream,
            })
        } else {
            None
        }
    }

    /// Whether a fetch for the stream is currently outstanding.
    #[must_use]
    pub fn is_in_flight(&self, stream: ResourceStream) -> bool {
        self.in_flight[stream.index()].load(Ordering::Acquire)
    }

    fn release(&self, stream: ResourceStream) {
        self.in_flight[stream.index()].store(false, Ordering::Release);
    }
}

/// Held for the duration of one stream fetch.
#[derive(Debug)]
pub struct StreamPermit<'a> {
    guard: &'a StreamGuard,
    stream: ResourceStream,
}

impl Drop for StreamPermit<'_> {
    fn drop(&mut self) {
        self.guard.release(self.stream);
    }
}
