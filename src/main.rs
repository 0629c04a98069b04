//! hn-archiver main entry point
//!
//! This is the command-line interface for the incremental news archiver.

use anyhow::Context;
use clap::Parser;
use hn_archiver::config::{load_config_with_hash, validate, Config};
use hn_archiver::crawler::build_monitor;
use hn_archiver::stats::{load_statistics, print_statistics};
use hn_archiver::storage::ArchiveStore;
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// hn-archiver: archive new front page stories with their discussions
///
/// Polls the front page on a fixed interval and saves, for every story that
/// has not been archived yet, the linked article, the discussion thread, and
/// every link posted in the thread.
#[derive(Parser, Debug)]
#[command(name = "hn-archiver")]
#[command(version)]
#[command(about = "Incremental news front page archiver", long_about = None)]
struct Cli {
    /// Output files directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Main page check interval (seconds)
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single cycle and exit
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    once: bool,

    /// Show archive statistics and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    stats: bool,

    /// Print the resolved configuration and exit
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_monitor(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hn_archiver=info,warn"),
            1 => EnvFilter::new("hn_archiver=debug,info"),
            _ => EnvFilter::new("hn_archiver=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if let Some(interval) = cli.interval {
        config.crawler.interval = interval;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode
fn handle_dry_run(config: &Config) {
    println!("=== hn-archiver Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Interval: {}s", config.crawler.interval);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Max connections per host: {}",
        config.crawler.max_host_connections
    );
    println!("  Dispatch delay: {}ms", config.crawler.dispatch_delay);

    println!("\nSource:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  User agent: {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Archive: {}\n", config.output.directory.display());

    let store = ArchiveStore::new(config.output.directory.clone());
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let monitor = build_monitor(config).context("Failed to start crawler")?;

    let report = monitor.run_once().await?;
    tracing::info!(
        "Cycle finished: {} listed, {} skipped, {} dispatched",
        report.listed,
        report.skipped,
        report.dispatched
    );

    Ok(())
}

/// Handles the main monitoring loop
async fn handle_monitor(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Archiving {} into {}",
        config.source.base_url,
        config.output.directory.display()
    );

    let monitor = build_monitor(config).context("Failed to start crawler")?;
    monitor.run(shutdown_signal()).await;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
