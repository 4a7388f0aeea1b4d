//! pixiv-crawler main entry point
//!
//! Command-line interface for crawling pixiv by tag, and for starting the web
//! front end.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pixiv_crawler::auth::login_flow_from_config;
use pixiv_crawler::config::{load_config_with_hash, validate, Config};
use pixiv_crawler::crawler::Coordinator;
use pixiv_crawler::model::split_tag_list;
use pixiv_crawler::output::{print_summary, write_archive};
use pixiv_crawler::search::build_http_client;
use pixiv_crawler::{CrawlRequest, StatusLog};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// pixiv-crawler: tag-based illustration crawler
///
/// Searches pixiv for one or more tags, keeps the most bookmarked
/// illustrations and saves them as PNG files.
#[derive(Parser, Debug)]
#[command(name = "pixiv-crawler")]
#[command(version)]
#[command(about = "Tag-based pixiv illustration crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a tag and download the most bookmarked illustrations
    Run(RunArgs),

    /// Start the web front end
    Serve {
        /// Address to listen on, overriding `server.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Tag to search; a comma-separated list searches several tags in order
    #[arg(value_name = "TAG")]
    tag: String,

    /// Number of illustrations to download
    #[arg(value_name = "MAX_COUNT")]
    max_count: Option<usize>,

    /// Additional tags to exclude (comma separated)
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Do not apply the configured exclude tags
    #[arg(long)]
    no_default_excludes: bool,

    /// Candidates collected per requested image before ranking
    #[arg(long, value_name = "N")]
    multiplier: Option<usize>,

    /// Output directory (default: `{tag}_imgs`)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of simultaneous downloads
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Also write `{output}.zip` with the saved images
    #[arg(long)]
    archive: bool,

    /// pixiv ID used when no token is cached
    #[arg(long, env = "PIXIV_ID", hide_env_values = true)]
    username: Option<String>,

    /// pixiv password used when no token is cached
    #[arg(long, env = "PIXIV_PW", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    match cli.command {
        Command::Run(args) => handle_run(config, args).await,
        Command::Serve { bind } => handle_serve(config, bind).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pixiv_crawler=info,warn"),
            1 => EnvFilter::new("pixiv_crawler=debug,info"),
            2 => EnvFilter::new("pixiv_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// `{dir}.zip` next to the output directory
fn archive_path(dir: &Path) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".zip");
    PathBuf::from(name)
}

/// Handles the `run` subcommand: one crawl in the foreground
async fn handle_run(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.crawler.download_concurrency = concurrency;
        validate(&config)?;
    }

    let mut excludes = if args.no_default_excludes {
        Vec::new()
    } else {
        config.crawler.exclude_tags.clone()
    };
    excludes.extend(args.exclude);

    let request = CrawlRequest::new(
        split_tag_list(&args.tag),
        excludes,
        args.max_count
            .unwrap_or(config.crawler.max_items as usize),
        args.multiplier
            .unwrap_or(config.crawler.pool_multiplier as usize),
    )?;

    let output_dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}_imgs", request.tags.join("_"))));

    tracing::info!(
        "Tags: {:?}, excluded: {}, output: {}",
        request.tags,
        request.exclude_tags.len(),
        output_dir.display()
    );

    let login_http = build_http_client(
        &config.download.user_agent,
        config.crawler.request_timeout_secs,
    )?;
    let login = login_flow_from_config(&config, login_http, args.username, args.password);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight downloads");
            ctrl_c_token.cancel();
        }
    });

    let coordinator = Coordinator::new(config, StatusLog::default())
        .with_login(login)
        .with_cancellation(cancel);

    let report = match coordinator.run(&request, &output_dir).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&report.summary, &report.output_dir);

    if args.archive {
        let destination = archive_path(&report.output_dir);
        let bytes = write_archive(&report.output_dir, &destination)
            .with_context(|| format!("failed to write {}", destination.display()))?;
        println!("✓ Archive written to: {} ({} bytes)", destination.display(), bytes);
    }

    Ok(())
}

/// Handles the `serve` subcommand
async fn handle_serve(mut config: Config, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
        validate(&config)?;
    }

    tracing::info!("Downloads are stored under {}", config.server.download_root);
    pixiv_crawler::server::serve(config).await?;
    Ok(())
}
