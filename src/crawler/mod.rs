//! Crawler module for per-website email discovery
//!
//! This module contains the core harvesting logic, including:
//! - Page fetching with hard deadlines
//! - Email extraction from loaded pages
//! - The per-website fallback search
//! - The sequential batch driver

mod coordinator;
mod extractor;
mod fetcher;
mod orchestrator;

pub use coordinator::Coordinator;
pub use extractor::{
    extract_email, extract_from_text, extract_mailto, find_contact_links, looks_like_email,
    EmailCandidate, PlaceholderFilter, Provenance, EMAIL_REGEX,
};
pub use fetcher::{fetch_page, PageFetchResult};
pub use orchestrator::Orchestrator;

use crate::config::Config;
use crate::output::{CheckpointWriter, RunSummary};
use crate::session::build_factory;
use crate::storage::RecordSet;
use std::future::Future;
use std::path::Path;

/// Runs a complete harvest over a record set
///
/// This is the main entry point for a run. It will:
/// 1. Open the checkpoint writer for the output destination
/// 2. Build the session factory selected by configuration
/// 3. Process every website-bearing record after `start_from`
/// 4. Write a final checkpoint
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `records` - Records to fill in
/// * `output` - Output destination, also the resume source
/// * `start_from` - Number of website-bearing records to skip
/// * `shutdown` - Resolves when the run should stop early
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed or was interrupted
/// * `Err(HarvestError)` - Run aborted
///
/// # Example
///
/// ```no_run
/// use contact_harvest::config::Config;
/// use contact_harvest::crawler::harvest;
/// use contact_harvest::storage::load_records;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let records = load_records(Path::new("leads.csv"))?;
/// let summary = harvest(
///     Config::default(),
///     records,
///     Path::new("leads_updated_emails.csv"),
///     0,
///     std::future::pending(),
/// )
/// .await?;
/// println!("Found {} emails", summary.found);
/// # Ok(())
/// # }
/// ```
pub async fn harvest<F>(
    config: Config,
    records: RecordSet,
    output: &Path,
    start_from: usize,
    shutdown: F,
) -> crate::Result<RunSummary>
where
    F: Future<Output = ()>,
{
    let checkpoint = CheckpointWriter::open(output)?;
    let factory = build_factory(&config.session);
    let mut coordinator = Coordinator::new(config, records, checkpoint, factory);
    coordinator.run_until(start_from, shutdown).await
}
