//! Progress reporting for sync operations.
//!
//! This module provides two modes of progress reporting:
//! - Interactive mode (TTY): Animated progress bars using indicatif
//! - Logging mode (non-TTY): Structured logging using tracing
//!
//! Progress bars are organized as:
//! - Stream bar(s): One per resource stream, showing page fetches
//! - Sweep bar: Single spinner for followings sweep pages
//! - Favorites bar: Single bar for the sweep's favorites fetches

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use audiograph::sync::{ProgressCallback, SyncProgress};
use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Interactive progress bars for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (CI, pipes).
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    /// Create an interactive reporter (for testing or forcing TTY mode).
    #[allow(dead_code)]
    pub fn interactive() -> Self {
        Self::Interactive(InteractiveReporter::new())
    }

    /// Create a logging reporter (for testing or forcing non-TTY mode).
    #[allow(dead_code)]
    pub fn logging() -> Self {
        Self::Logging(LoggingReporter::new())
    }

    /// Handle a progress event.
    pub fn handle(&self, event: SyncProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> Arc<ProgressCallback> {
        let reporter = Arc::clone(self);
        Arc::new(Box::new(move |event| {
            reporter.handle(event);
        }))
    }

    /// Finish all progress bars (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// State for tracking fetch progress per resource stream.
struct StreamState {
    bar: ProgressBar,
    pages: usize,
    merged: usize,
    done: bool,
}

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Fetch progress bars by stream name.
    stream_bars: HashMap<String, StreamState>,
    /// Single spinner for sweep page progress.
    sweep_bar: Option<ProgressBar>,
    /// Single bar for the sweep's favorites fetches.
    favorites_bar: Option<ProgressBar>,
    /// Favorites fetches scheduled so far.
    favorites_total: usize,
}

/// Interactive progress reporter using indicatif.
///
/// All mutable state is consolidated into a single `Mutex<ProgressState>`
/// to ensure consistent updates and avoid lock ordering issues.
pub struct InteractiveReporter {
    multi: MultiProgress,
    /// Consolidated progress state under a single lock.
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    /// Create a new interactive reporter.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: SyncProgress) {
        // Acquire single lock for all state access
        let mut state = self.state.lock().unwrap();

        match event {
            SyncProgress::FetchStarted { stream } => {
                let entry = state
                    .stream_bars
                    .entry(stream.to_string())
                    .or_insert_with(|| {
                        let pb = self.multi.add(ProgressBar::new_spinner());
                        pb.set_style(Self::spinner_style());
                        pb.enable_steady_tick(std::time::Duration::from_millis(100));
                        pb.set_prefix(format!("{:12}", stream.to_string()));
                        StreamState {
                            bar: pb,
                            pages: 0,
                            merged: 0,
                            done: false,
                        }
                    });
                entry.bar.set_message("Fetching page...");
            }

            SyncProgress::FetchSkipped { stream } => {
                // Release lock before printing to avoid holding it during I/O
                drop(state);
                self.multi
                    .println(format!("⚠ {} fetch already in flight, skipped", stream))
                    .ok();
            }

            SyncProgress::PageFetched {
                stream,
                items,
                has_more,
            } => {
                if let Some(stream_state) = state.stream_bars.get_mut(stream.as_str()) {
                    stream_state.pages += 1;
                    let more = if has_more { "" } else { ", last page" };
                    stream_state.bar.set_message(format!(
                        "Page {} ({} items{})",
                        stream_state.pages, items, more
                    ));
                }
            }

            SyncProgress::EntitiesMerged { stream, count } => {
                if let Some(stream_state) = state.stream_bars.get_mut(stream.as_str()) {
                    stream_state.merged += count;
                }
            }

            SyncProgress::CursorAdvanced { stream, next_href } => {
                if next_href.is_none()
                    && let Some(stream_state) = state.stream_bars.get_mut(stream.as_str())
                    && !stream_state.done
                {
                    stream_state.done = true;
                    stream_state.bar.finish_with_message(format!(
                        "✓ {} pages, {} entities merged, exhausted",
                        stream_state.pages, stream_state.merged
                    ));
                }
            }

            SyncProgress::FetchFinished { stream } => {
                let _ = stream;
            }

            SyncProgress::TransportRetry {
                attempt,
                delay_ms,
                error,
            } => {
                let retry_msg = format!(
                    "⏳ retry {} in {:.1}s: {}",
                    attempt,
                    delay_ms as f64 / 1000.0,
                    error
                );
                // Show on whichever bar is active
                let mut shown = false;
                for stream_state in state.stream_bars.values() {
                    if !stream_state.done {
                        stream_state.bar.set_message(retry_msg.clone());
                        shown = true;
                        break;
                    }
                }
                if !shown && let Some(ref pb) = state.favorites_bar {
                    pb.set_message(retry_msg);
                }
            }

            SyncProgress::SweepStarted => {
                if state.sweep_bar.is_none() {
                    let pb = self.multi.add(ProgressBar::new_spinner());
                    pb.set_style(Self::spinner_style());
                    pb.enable_steady_tick(std::time::Duration::from_millis(100));
                    pb.set_prefix(format!("{:12}", "Sweep"));
                    pb.set_message("Fetching followings...");
                    state.sweep_bar = Some(pb);
                }
            }

            SyncProgress::SweepPage {
                page,
                new_followings,
            } => {
                if let Some(ref pb) = state.sweep_bar {
                    pb.set_message(format!("Page {} (+{} new followings)", page, new_followings));
                }
            }

            SyncProgress::FavoritesScheduled { user_id: _ } => {
                state.favorites_total += 1;

                if state.favorites_bar.is_none() {
                    let pb = self.multi.add(ProgressBar::new(state.favorites_total as u64));
                    pb.set_style(Self::bar_style());
                    pb.set_prefix(format!("{:12}", "Favorites"));
                    pb.set_message("Fetching favorites...");
                    state.favorites_bar = Some(pb);
                } else if let Some(ref pb) = state.favorites_bar {
                    pb.set_length(state.favorites_total as u64);
                }
            }

            SyncProgress::FavoritesFetched { user_id, merged } => {
                if let Some(ref pb) = state.favorites_bar {
                    pb.inc(1);
                    pb.set_message(format!("✓ user {} ({} entities)", user_id, merged));
                }
            }

            SyncProgress::FavoritesError { user_id, message } => {
                if let Some(ref pb) = state.favorites_bar {
                    pb.inc(1);
                    pb.set_message(format!("✗ user {}: {}", user_id, message));
                }
            }

            SyncProgress::SweepFinished {
                pages,
                followings,
                favorites_fetched,
                errors,
                cancelled,
            } => {
                if let Some(ref pb) = state.sweep_bar {
                    let msg = if cancelled {
                        format!("✗ cancelled after {} pages ({} followings)", pages, followings)
                    } else {
                        format!("✓ {} pages, {} followings", pages, followings)
                    };
                    pb.finish_with_message(msg);
                }

                if let Some(ref pb) = state.favorites_bar {
                    let msg = if errors > 0 {
                        format!("✓ {} favorites fetched, {} errors", favorites_fetched, errors)
                    } else {
                        format!("✓ {} favorites fetched", favorites_fetched)
                    };
                    pb.finish_with_message(msg);
                }
            }

            SyncProgress::Warning { message } => {
                // Release lock before printing to avoid holding it during I/O
                drop(state);
                self.multi.println(format!("⚠ {}", message)).ok();
            }

            _ => {}
        }
    }

    /// Finish all progress bars.
    pub fn finish(&self) {
        let state = self.state.lock().unwrap();
        for stream_state in state.stream_bars.values() {
            if !stream_state.bar.is_finished() {
                stream_state.bar.finish();
            }
        }
        if let Some(ref pb) = state.sweep_bar
            && !pb.is_finished()
        {
            pb.finish();
        }
        if let Some(ref pb) = state.favorites_bar
            && !pb.is_finished()
        {
            pb.finish();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self
    }

    /// Handle a progress event.
    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchStarted { stream } => {
                tracing::info!(stream = %stream, "Fetching page");
            }

            SyncProgress::FetchSkipped { stream } => {
                tracing::warn!(stream = %stream, "Fetch already in flight, skipped");
            }

            SyncProgress::PageFetched {
                stream,
                items,
                has_more,
            } => {
                tracing::debug!(stream = %stream, items, has_more, "Fetched page");
            }

            SyncProgress::EntitiesMerged { stream, count } => {
                tracing::debug!(stream = %stream, count, "Merged entities");
            }

            SyncProgress::CursorAdvanced { stream, next_href } => {
                if next_href.is_none() {
                    tracing::info!(stream = %stream, "Stream exhausted");
                } else {
                    tracing::debug!(stream = %stream, next_href = ?next_href, "Cursor advanced");
                }
            }

            SyncProgress::FetchFinished { stream } => {
                tracing::debug!(stream = %stream, "Fetch finished");
            }

            SyncProgress::TransportRetry {
                attempt,
                delay_ms,
                error,
            } => {
                tracing::warn!(attempt, delay_ms, error = %error, "Transient failure, backing off");
            }

            SyncProgress::SweepStarted => {
                tracing::info!("Sweeping followings");
            }

            SyncProgress::SweepPage {
                page,
                new_followings,
            } => {
                tracing::debug!(page, new_followings, "Swept followings page");
            }

            SyncProgress::FavoritesScheduled { user_id } => {
                tracing::debug!(user_id, "Favorites fetch scheduled");
            }

            SyncProgress::FavoritesFetched { user_id, merged } => {
                tracing::debug!(user_id, merged, "Favorites fetched");
            }

            SyncProgress::FavoritesError { user_id, message } => {
                tracing::warn!(user_id, message = %message, "Favorites fetch failed");
            }

            SyncProgress::SweepFinished {
                pages,
                followings,
                favorites_fetched,
                errors,
                cancelled,
            } => {
                tracing::info!(
                    pages,
                    followings,
                    favorites_fetched,
                    errors,
                    cancelled,
                    "Sweep complete"
                );
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
