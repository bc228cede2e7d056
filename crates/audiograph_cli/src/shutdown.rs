//! Graceful Ctrl+C handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use console::Term;

/// Install the Ctrl+C handler and return the flag it raises.
///
/// The first Ctrl+C asks running operations to wind down; the second
/// exits immediately with the conventional 130 status.
pub(crate) fn setup_shutdown_handler() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let requested = Arc::clone(&flag);

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current operations...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current operations");
        }

        requested.store(true, Ordering::Release);

        // Wait for second Ctrl+C for force quit
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install second Ctrl+C handler");

        if is_tty {
            eprintln!("Force quit!");
        }
        std::process::exit(130);
    });

    flag
}
