//! Bulk followings sweep command.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use audiograph::sync::{SweepOptions, sweep_followings};
use console::Term;

use crate::CommonSyncOptions;
use crate::commands::shared::{
    build_synchronizer, display_sweep_errors, print_store_summary, write_snapshot,
};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Mirror every following and each following's favorites.
pub(crate) async fn handle_sweep(
    concurrency: Option<usize>,
    opts: CommonSyncOptions,
    config: &Config,
    shutdown: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();

    let reporter = Arc::new(ProgressReporter::new());
    let engine = build_synchronizer(config, reporter.as_callback(), shutdown)?;

    let options = SweepOptions {
        concurrency: concurrency.unwrap_or(config.sync.concurrency),
    };

    let summary = sweep_followings(&engine, opts.user.as_deref(), &options).await?;

    reporter.finish();

    if is_tty {
        println!();
        if summary.cancelled {
            println!(
                "Sweep cancelled after {} page(s); partial results kept.",
                summary.pages
            );
        } else {
            println!("Swept {} followings page(s).", summary.pages);
        }
        println!(
            "{} followings seen, {} favorites fetches, {} entities merged from favorites.",
            summary.followings, summary.favorites_fetched, summary.favorites_merged
        );
    } else {
        tracing::info!(
            pages = summary.pages,
            followings = summary.followings,
            favorites_fetched = summary.favorites_fetched,
            favorites_merged = summary.favorites_merged,
            cancelled = summary.cancelled,
            "Sweep finished"
        );
    }

    display_sweep_errors(&summary.errors, is_tty);

    print_store_summary(engine.store(), is_tty);

    if let Some(ref out) = opts.out {
        write_snapshot(engine.store(), out, is_tty)?;
    }

    Ok(())
}
