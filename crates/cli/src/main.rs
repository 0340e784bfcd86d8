//! tether command-line entry point.
//!
//! Fetches URLs through the interception manager and inspects the response
//! cache. Logs go to stderr so response bodies on stdout stay clean.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tether_client::StrategyKind;
use tether_core::AppConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Offline-capable HTTP response cache")]
#[command(version)]
struct Args {
    /// SQLite cache file (overrides TETHER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a URL through a caching strategy
    Fetch {
        /// Absolute URL, or path relative to the configured origin
        url: String,

        /// cache-first or cache-if-offline
        #[arg(long, default_value = "cache-first")]
        strategy: StrategyKind,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Scope to bind the strategy to (default: the requested URL)
        #[arg(long)]
        scope: Option<String>,

        /// Force offline mode for this request
        #[arg(long)]
        offline: bool,

        /// Do not revalidate cache-first hits in the background
        #[arg(long)]
        no_background_fetch: bool,

        /// Print response headers
        #[arg(short, long)]
        include: bool,
    },

    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List stored entries
    List,
    /// Remove every stored entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let mut config = AppConfig::load()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }

    match args.command {
        Command::Fetch { url, strategy, method, scope, offline, no_background_fetch, include } => {
            let options = commands::FetchOptions {
                url,
                strategy,
                method,
                scope,
                offline,
                background_fetch: !no_background_fetch,
                include_headers: include,
            };
            commands::fetch(&config, options).await
        }
        Command::Cache { action: CacheAction::List } => commands::cache_list(&config).await,
        Command::Cache { action: CacheAction::Clear } => commands::cache_clear(&config).await,
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
