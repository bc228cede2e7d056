//! Audiograph CLI - command-line interface for the collection mirror.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use audiograph::sync::ResourceStream;
use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "audiograph")]
#[command(version)]
#[command(about = "Mirror a listener's social graph from a paginated collection API")]
#[command(
    long_about = "Audiograph walks the paginated collection streams of an audio platform \
account (followings, followers, favorites, activities) and merges every page into a \
normalized, de-duplicated entity store. The store lives in memory for the duration of \
one invocation; use --out to export it as JSON."
)]
#[command(after_long_help = r#"EXAMPLES
    Fetch the first page of your followings:
        $ audiograph sync followings

    Crawl the favorites stream to the end:
        $ audiograph sync favorites --all

    Fetch three pages of another user's followers:
        $ audiograph sync followers --user 3207 --pages 3

    Mirror every following and each following's favorites:
        $ audiograph sweep --out graph.json

    Generate shell completions:
        $ audiograph completions bash > ~/.local/share/bash-completion/completions/audiograph

CONFIGURATION
    Audiograph reads configuration from:
      1. ~/.config/audiograph/config.toml (or $XDG_CONFIG_HOME/audiograph/config.toml)
      2. ./audiograph.toml in the current directory
      3. Environment variables (AUDIOGRAPH_* prefix, e.g., AUDIOGRAPH_CLIENT_ID)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    AUDIOGRAPH_API_HOST           API base URL (default: https://api.soundcloud.com)
    AUDIOGRAPH_CLIENT_ID          Client identifier appended to every request URL
    AUDIOGRAPH_SYNC_CONCURRENCY   Concurrent favorites fetches during a sweep (default: 8)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch pages from one collection stream
    Sync {
        /// Stream to fetch: followings, followers, favorites or activities
        stream: ResourceStream,

        /// Number of pages to fetch (default: 1)
        #[arg(short = 'p', long, conflicts_with = "all")]
        pages: Option<usize>,

        /// Keep fetching until the stream is exhausted
        #[arg(short = 'A', long)]
        all: bool,

        /// Reset the stream's cursor before fetching
        #[arg(short = 'f', long)]
        fresh: bool,

        #[command(flatten)]
        opts: CommonSyncOptions,
    },
    /// Mirror every following and each following's favorites
    Sweep {
        /// Maximum concurrent favorites fetches (default from config or 8)
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        opts: CommonSyncOptions,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Options shared by the sync and sweep commands.
#[derive(Debug, Clone, clap::Args)]
struct CommonSyncOptions {
    /// Act on this user id instead of the authenticated account
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Write the final entity store to this file as pretty-printed JSON
    #[arg(short = 'o', long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Set up graceful shutdown handler (Ctrl+C)
    let shutdown = shutdown::setup_shutdown_handler();

    // Initialize tracing for non-TTY mode (structured logging)
    // Only initialize if not connected to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("audiograph=info,audiograph_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            stream,
            pages,
            all,
            fresh,
            opts,
        } => {
            commands::sync::handle_sync(stream, pages, all, fresh, opts, &config, shutdown).await?;
        }
        Commands::Sweep { concurrency, opts } => {
            commands::sweep::handle_sweep(concurrency, opts, &config, shutdown).await?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
    }

    Ok(())
}
