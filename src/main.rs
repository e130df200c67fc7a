//! sitewalk main entry point
//!
//! This is the command-line interface for the sitewalk site crawler.

use clap::Parser;
use sitewalk::config::{load_config_with_hash, validate, Config, OutputFormat};
use sitewalk::crawler::{build_http_client, discover_seeds, run_crawl};
use sitewalk::output::print_statistics;
use sitewalk::url::Scope;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// sitewalk: a frontier-driven site crawler
///
/// sitewalk crawls a single site breadth-first from its seeds, sitemaps and
/// robots.txt, extracts structured content from every page and writes the
/// results even when interrupted.
#[derive(Parser, Debug)]
#[command(name = "sitewalk")]
#[command(version)]
#[command(about = "A frontier-driven site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the discovered seeds without crawling
    #[arg(long)]
    dry_run: bool,

    /// Skip sitemap discovery and start from the configured seeds only
    #[arg(long)]
    no_sitemap: bool,

    /// Override the output format (json, jsonl, sqlite)
    #[arg(long, value_name = "FMT")]
    format: Option<OutputFormat>,

    /// Override the results path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &cli);
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewalk=info,warn"),
            1 => EnvFilter::new("sitewalk=debug,info"),
            2 => EnvFilter::new("sitewalk=trace,debug"),
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

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.no_sitemap {
        config.crawler.use_sitemap = false;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.display().to_string();
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let crawler = &config.crawler;
    let scope = Scope::parse(&crawler.domain_scope, crawler.include_subdomains)?;
    let (min, max) = crawler.concurrency_bounds();

    println!("=== sitewalk Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Scope: {}", scope.origin());
    println!("  Include subdomains: {}", crawler.include_subdomains);
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Workers: {} to {}", min, max);
    println!("  Per-request timeout: {}ms", crawler.per_request_timeout);
    println!("  Navigation timeout: {}ms", crawler.navigation_timeout);
    match crawler.page_limit() {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Respect robots.txt: {}", crawler.respect_robots_txt);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {} ({:?})", config.output.results_path, config.output.format);
    if let Some(links_path) = &config.output.links_path {
        println!("  Links: {}", links_path);
    }

    println!("\nSeeds ({}):", crawler.seed_urls.len());
    for seed in &crawler.seed_urls {
        println!("  - {}", seed);
    }

    if crawler.use_sitemap {
        let client = build_http_client(&config.user_agent, crawler.navigation_timeout())?;
        let discovery = discover_seeds(crawler, &client).await?;
        println!("\nSitemap URLs ({}):", discovery.urls.len());
        for url in &discovery.urls {
            println!("  - {}", url);
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<ExitCode> {
    tracing::info!(
        "Scope: {}, seeds: {}, max depth: {}",
        config.crawler.domain_scope,
        config.crawler.seed_urls.len(),
        config.crawler.max_depth
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received interrupt signal, stopping crawl");
            let _ = shutdown_tx.send(true);
        }
    });

    match run_crawl(config, shutdown_rx).await {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(ExitCode::from(stats.outcome.exit_code()))
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
