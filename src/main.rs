//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product harvester.

use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::harvest;
use catalog_harvest::extract::ExtractionRuleSet;
use catalog_harvest::output::{build_sinks, print_summary, write_outputs, CsvSink};
use catalog_harvest::url::listing_url;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a polite product catalog harvester
///
/// Catalog-Harvest walks one paginated catalog listing, extracts a product
/// record from every detail page, stores each product image, and writes the
/// records to a daily CSV file and, optionally, a SQLite table.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite product catalog harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the SQLite sink even if [relational] is configured
    #[arg(long)]
    no_relational: bool,

    /// Write the CSV file (and images, unless images-dir is set) here instead
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.to_string_lossy().into_owned();
    }

    if cli.dry_run {
        handle_dry_run(&config, !cli.no_relational)
    } else {
        handle_harvest(config, !cli.no_relational).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, relational: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog-Harvest Dry Run ===\n");

    let catalog = &config.catalog;
    println!("Catalog:");
    println!("  Source: {}", catalog.source);
    println!(
        "  First listing page: {}",
        listing_url(&catalog.listing_url, catalog.start_offset, catalog.page_size)
    );
    println!("  Page size: {}", catalog.page_size);
    println!("  Max pages: {}", catalog.max_pages);

    println!("\nHTTP:");
    println!("  Politeness delay: {}ms", config.http.politeness_delay_ms);
    println!("  Max attempts: {}", config.http.max_attempts);
    println!("  Workers: {}", config.http.workers);
    println!("  Headers: {}", config.http.headers.len());

    let rules = ExtractionRuleSet::from_config(&config.fields)?;
    println!("\nFields:");
    for (field, rule) in rules.iter() {
        println!("  - {} ({:?})", field, rule.mode);
    }
    println!("  - item_category (from detail URL)");

    let sinks = build_sinks(config, relational)?;
    let csv = CsvSink::new(&config.output.dir, &catalog.source);
    println!("\nOutput:");
    println!(
        "  CSV: {}",
        csv.path_for(chrono::Local::now().date_naive()).display()
    );
    println!("  Images: {}", config.output.images_dir().display());
    for sink in sinks.iter().skip(1) {
        println!("  Also: {}", sink.name());
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would write to {} sinks", sinks.len());

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, relational: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Fail before crawling if a sink cannot be set up
    let mut sinks = build_sinks(&config, relational)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            on_interrupt.cancel();
        }
    });

    let run = match harvest(&config, &cancel).await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    let outcomes = write_outputs(&run, &mut sinks);
    print_summary(&run, &outcomes);

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|outcome| !outcome.is_ok())
        .map(|outcome| outcome.sink.as_str())
        .collect();
    if !failed.is_empty() {
        return Err(format!("sink(s) failed: {}", failed.join(", ")).into());
    }

    Ok(())
}
