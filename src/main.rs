//! Contact-Harvest main entry point
//!
//! This is the command-line interface for the Contact-Harvest email finder.

use clap::Parser;
use contact_harvest::config::{load_config_with_hash, Config};
use contact_harvest::crawler::harvest;
use contact_harvest::output::{collect_statistics, print_run_summary, print_statistics};
use contact_harvest::storage::{default_output_path, load_records, resume_source};
use contact_harvest::HarvestError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Contact-Harvest: finds contact emails for business websites
///
/// Reads a business directory (CSV or SQLite), visits each business website
/// and fills in the Email column. Progress is checkpointed to the output
/// file; an interrupted run resumes with --start-from.
#[derive(Parser, Debug)]
#[command(name = "contact-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Finds contact emails for business websites", long_about = None)]
struct Cli {
    /// Business records (.csv, or .db/.sqlite/.sqlite3)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file [default: <INPUT stem>_updated_emails.<ext>]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Number of records with a website already processed
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    start_from: usize,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Load config and records, show what would be processed, and exit
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show outcome statistics from the output file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.input, &output, cli.start_from)?;
    } else if cli.stats {
        handle_stats(&output)?;
    } else {
        handle_harvest(config, &cli.input, &output, cli.start_from).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_harvest=info,warn"),
            1 => EnvFilter::new("contact_harvest=debug,info"),
            2 => EnvFilter::new("contact_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows what a run would do
fn handle_dry_run(
    config: &Config,
    input: &Path,
    output: &Path,
    start_from: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Contact-Harvest Dry Run ===\n");

    println!("Session:");
    println!("  Backend: {:?}", config.session.backend);
    println!("  User agent: {}", config.session.user_agent);
    if let Some(path) = &config.session.chrome_path {
        println!("  Chrome path: {}", path);
    }

    println!("\nCrawl:");
    println!("  Main page timeout: {}ms", config.crawl.main_page_timeout_ms);
    println!("  Secondary timeout: {}ms", config.crawl.secondary_timeout_ms);
    println!("  Contact paths ({}):", config.crawl.contact_paths.len());
    for path in &config.crawl.contact_paths {
        println!("    * {}", path);
    }
    println!("  Discovered links per site: {}", config.crawl.max_discovered_links);

    println!("\nRun:");
    println!("  Checkpoint every: {} records", config.run.checkpoint_every);
    println!(
        "  Restart after {} consecutive errors, and every {} records",
        config.run.max_consecutive_errors, config.run.restart_every
    );
    println!("  Politeness delay: {}ms", config.run.politeness_delay_ms);

    let source = resume_source(input, output, start_from);
    let records = load_records(source)?;
    let positions = records.website_positions();
    let pending = positions.len().saturating_sub(start_from);

    println!("\nRecords:");
    println!("  Source: {}", source.display());
    println!("  Output: {}", output.display());
    println!("  Total rows: {}", records.len());
    println!("  Rows with a website: {}", positions.len());
    println!("  Starting at: {}", start_from);

    println!("\n✓ Configuration is valid");
    println!("✓ Would process {} records", pending);
    for &position in positions.iter().skip(start_from).take(10) {
        let record = &records.records()[position];
        println!(
            "    * {} ({})",
            record.label(),
            record.website.as_deref().unwrap_or("")
        );
    }
    if pending > 10 {
        println!("    ... and {} more", pending - 10);
    }

    Ok(())
}

/// Handles the --stats mode: shows outcome statistics from the output file
fn handle_stats(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Records: {}\n", output.display());

    let records = load_records(output)?;
    let stats = collect_statistics(&records);
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    input: &Path,
    output: &Path,
    start_from: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = resume_source(input, output, start_from);
    tracing::info!("Loading records from {}", source.display());
    let records = load_records(source)?;
    tracing::info!(
        "Loaded {} records, {} with a website; writing to {}",
        records.len(),
        records.website_positions().len(),
        output.display()
    );

    match harvest(config, records, output, start_from, shutdown_signal()).await {
        Ok(summary) => {
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            if let HarvestError::Aborted { resume_from, .. } = &e {
                eprintln!(
                    "Progress saved to {}. Resume with --start-from {}",
                    output.display(),
                    resume_from
                );
            }
            Err(e.into())
        }
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Ctrl-C received, finishing up");
}
