//! Helpers shared by the sync and sweep commands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use audiograph::http::reqwest_transport::ReqwestTransport;
use audiograph::sync::{CursorTracker, ProgressCallback, StreamGuard, Synchronizer};
use audiograph::{ApiClient, EntityId, EntityKind, EntityStore, RetryingTransport};

use crate::config::Config;

/// Build a synchronizer over the retrying reqwest transport stack.
///
/// The entity store, cursors and guard all start empty; they live for
/// one CLI invocation.
pub(crate) fn build_synchronizer(
    config: &Config,
    callback: Arc<ProgressCallback>,
    shutdown: Arc<AtomicBool>,
) -> Result<Synchronizer, Box<dyn std::error::Error>> {
    let transport = ReqwestTransport::with_timeout(config.request_timeout())?;
    let retrying = RetryingTransport::new(Arc::new(transport), config.retry_config())
        .with_progress(Arc::clone(&callback));

    let client = ApiClient::with_transport(
        &config.api.host,
        config.api.client_id.as_deref(),
        Arc::new(retrying),
    );

    Ok(Synchronizer::new(
        client,
        Arc::new(EntityStore::new()),
        Arc::new(CursorTracker::new()),
        Arc::new(StreamGuard::new()),
    )
    .with_progress(callback)
    .with_shutdown_flag(shutdown))
}

/// Print a final entity count summary.
pub(crate) fn print_store_summary(store: &EntityStore, is_tty: bool) {
    if is_tty {
        println!();
        println!("Entities in store:");
        for kind in EntityKind::ALL {
            let count = store.count(kind);
            if count > 0 {
                println!("  {:10} {}", kind.as_str(), count);
            }
        }
        println!("  {:10} {}", "total", store.len());
    } else {
        tracing::info!(
            users = store.count(EntityKind::User),
            tracks = store.count(EntityKind::Track),
            total = store.len(),
            "Entities in store"
        );
    }
}

/// Display per-following favorites errors without flooding the terminal.
///
/// Limited to the first 10 so a large sweep with a broken API does not
/// scroll the summary away.
pub(crate) fn display_sweep_errors(errors: &[(EntityId, String)], is_tty: bool) {
    if errors.is_empty() {
        return;
    }

    let total_errors = errors.len();
    let display_count = std::cmp::min(10, total_errors);

    if is_tty {
        println!();
        eprintln!(
            "\x1b[1;33mFavorites fetch errors ({} total):\x1b[0m",
            total_errors
        );
        for (user_id, error) in errors.iter().take(display_count) {
            eprintln!("  - user {}: {}", user_id, error);
        }
        if total_errors > display_count {
            eprintln!("  ... and {} more errors", total_errors - display_count);
        }
    } else {
        for (user_id, error) in errors.iter().take(display_count) {
            tracing::error!(user_id = *user_id, error = %error, "Favorites fetch failed");
        }
        if total_errors > display_count {
            tracing::error!(
                additional_errors = total_errors - display_count,
                "Additional favorites fetch errors occurred"
            );
        }
    }
}

/// Serialize the store to pretty-printed JSON at the given path.
pub(crate) fn write_snapshot(
    store: &EntityStore,
    path: &Path,
    is_tty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&store.snapshot())?;
    std::fs::write(path, json)?;

    if is_tty {
        println!("Wrote entity snapshot to {}", path.display());
    } else {
        tracing::info!(path = %path.display(), "Wrote entity snapshot");
    }

    Ok(())
}
