//! Single-stream sync command.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use audiograph::sync::ResourceStream;
use console::Term;

use crate::CommonSyncOptions;
use crate::commands::shared::{build_synchronizer, print_store_summary, write_snapshot};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Fetch one or more pages from a single collection stream.
pub(crate) async fn handle_sync(
    stream: ResourceStream,
    pages: Option<usize>,
    all: bool,
    fresh: bool,
    opts: CommonSyncOptions,
    config: &Config,
    shutdown: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();

    let reporter = Arc::new(ProgressReporter::new());
    let engine = build_synchronizer(config, reporter.as_callback(), shutdown)?;

    if fresh {
        engine.cursors().reset(stream);
    }

    let page_budget = if all { usize::MAX } else { pages.unwrap_or(1) };

    let mut fetched_pages = 0;
    while fetched_pages < page_budget {
        if engine.shutdown_requested() {
            break;
        }
        if engine.cursors().get(stream).is_exhausted() {
            break;
        }

        let report = engine.sync(stream, opts.user.as_deref(), false).await?;
        fetched_pages += 1;

        if report.cursor.is_exhausted() {
            break;
        }
    }

    reporter.finish();

    let exhausted = engine.cursors().get(stream).is_exhausted();
    if is_tty {
        println!();
        if exhausted {
            println!(
                "Reached the end of {} after {} page(s).",
                stream, fetched_pages
            );
        } else {
            println!("Fetched {} page(s) of {}; more remain.", fetched_pages, stream);
        }
    } else {
        tracing::info!(stream = %stream, pages = fetched_pages, exhausted, "Sync finished");
    }

    print_store_summary(engine.store(), is_tty);

    if let Some(ref out) = opts.out {
        write_snapshot(engine.store(), out, is_tty)?;
    }

    Ok(())
}
