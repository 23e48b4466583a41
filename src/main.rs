//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest content harvester.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use sumi_harvest::config::{load_config_with_hash, parse_keywords, validate, Config};
use sumi_harvest::crawler::Coordinator;
use sumi_harvest::output::{
    format_statistics_markdown, print_statistics, write_export, write_markdown_pages,
};
use sumi_harvest::url::extract_domain;
use sumi_harvest::ExportFormat;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a bounded web content harvester
///
/// Sumi-Harvest follows links breadth-first from a start page, under a page
/// budget and a depth budget, and exports the title, text and links of every
/// page that matches the keyword filter.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A bounded web content harvester", long_about = None)]
struct Cli {
    /// Page to start crawling from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of pages to collect
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum number of link hops from the start page
    #[arg(long)]
    max_depth: Option<u32>,

    /// Comma-separated keywords; a page must contain at least one
    #[arg(short, long, value_name = "KEYWORDS")]
    keywords: Option<String>,

    /// Export format: csv, markdown, json or xml
    #[arg(short, long)]
    format: Option<String>,

    /// Write the export to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Maximum number of concurrent fetches
    #[arg(long)]
    concurrency: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Follow links to other hosts
    #[arg(long)]
    all_hosts: bool,

    /// Also write one markdown file per page into this directory
    #[arg(long, value_name = "DIR")]
    markdown_dir: Option<PathBuf>,

    /// Write a markdown run summary to this file
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Validate configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config)?;
    let format = config.export_format()?;

    if cli.dry_run {
        return handle_dry_run(&config, &cli.start_url, format);
    }

    handle_crawl(config, &cli, format).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so an export written to stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags win over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(keywords) = &cli.keywords {
        config.keywords = parse_keywords(keywords);
    }
    if let Some(format) = &cli.format {
        config.output.format = format.clone();
    }
    if let Some(output) = &cli.output {
        config.output.path = Some(output.display().to_string());
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_fetches = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.request_timeout_secs = timeout;
    }
    if cli.all_hosts {
        config.crawler.same_host_only = false;
    }
}

/// Handles the --dry-run mode: validates inputs and shows what would be crawled
fn handle_dry_run(config: &Config, start_url: &str, format: ExportFormat) -> Result<()> {
    let coordinator = Coordinator::new(config, start_url)?;
    let budget = coordinator.budget();

    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Start URL: {}", coordinator.start_url());
    if let Some(host) = extract_domain(coordinator.start_url()) {
        println!("Host: {}", host);
    }

    println!("\nBudget:");
    println!("  Max pages: {}", budget.max_pages);
    println!("  Max depth: {}", budget.max_depth);
    println!("  Max attempts: {}", budget.max_attempts);
    if budget.keywords.is_empty() {
        println!("  Keywords: (none, every page is kept)");
    } else {
        println!("  Keywords: {}", budget.keywords.join(", "));
    }

    println!("\nCrawler:");
    println!("  Concurrent fetches: {}", config.crawler.max_concurrent_fetches);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Same host only: {}", config.crawler.same_host_only);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {}", format);
    println!(
        "  Destination: {}",
        config.output.path.as_deref().unwrap_or("stdout")
    );

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cli: &Cli, format: ExportFormat) -> Result<()> {
    let coordinator = Coordinator::new(&config, &cli.start_url)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            interrupt.cancel();
        }
    });

    let report = coordinator.run(cancel).await?;

    if !cli.quiet {
        print_statistics(&report.stats);
    }

    match &config.output.path {
        Some(path) => {
            let path = PathBuf::from(path);
            write_export(&report.records, format, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                "Exported {} records as {} to {}",
                report.records.len(),
                format,
                path.display()
            );
        }
        None => print!("{}", report.export(format)?),
    }

    if let Some(dir) = &cli.markdown_dir {
        let files = write_markdown_pages(&report.records, dir)
            .with_context(|| format!("failed to write pages to {}", dir.display()))?;
        tracing::info!("Wrote {} markdown files to {}", files.len(), dir.display());
    }

    if let Some(path) = &cli.summary {
        std::fs::write(path, format_statistics_markdown(&report.stats))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(())
}
