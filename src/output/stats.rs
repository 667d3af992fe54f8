//! Outcome statistics and run summaries
//!
//! `OutcomeStatistics` is computed from a record set on disk (the `--stats`
//! mode). `RunSummary` describes one run of the batch driver.

use crate::state::{CrawlState, OutcomeKind};
use crate::storage::RecordSet;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Outcome counts over a whole record set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Records with a non-empty `Website` cell
    pub website_records: usize,

    /// Website-bearing records whose `Email` cell is still empty
    pub pending: usize,

    /// Non-empty `Email` cells that are neither an address nor an outcome
    pub unrecognized: usize,

    /// Count of records by outcome
    pub by_kind: BTreeMap<OutcomeKind, usize>,
}

impl OutcomeStatistics {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Records that carry any outcome
    pub fn resolved(&self) -> usize {
        self.by_kind.values().sum()
    }
}

/// Computes outcome statistics for a record set
pub fn collect_statistics(records: &RecordSet) -> OutcomeStatistics {
    let mut stats = OutcomeStatistics {
        total_records: records.len(),
        ..Default::default()
    };

    for record in records.records() {
        if record.has_website() {
            stats.website_records += 1;
        }

        match (record.email(), record.outcome()) {
            (_, Some(outcome)) => *stats.by_kind.entry(outcome.kind()).or_insert(0) += 1,
            (Some(_), None) => stats.unrecognized += 1,
            (None, None) => {
                if record.has_website() {
                    stats.pending += 1;
                }
            }
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &OutcomeStatistics) {
    println!("=== Email Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Records with a website: {}", stats.website_records);
    println!("  Not yet processed: {}", stats.pending);
    if stats.unrecognized > 0 {
        println!("  Unrecognized email values: {}", stats.unrecognized);
    }
    println!();

    println!("Records by Outcome:");
    let resolved = stats.resolved();
    for kind in OutcomeKind::all_kinds() {
        let count = stats.count(kind);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / resolved as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", kind, count, percentage);
    }
    println!();

    let found = stats.count(OutcomeKind::Found);
    let hit_rate = if resolved > 0 {
        (found as f64 / resolved as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Hit Rate: {:.1}% ({} / {} records with an email)",
        hit_rate, found, resolved
    );
}

/// Result of one run of the batch driver
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Records processed in this run
    pub processed: usize,
    pub found: usize,
    pub not_found: usize,
    pub no_website: usize,
    pub errors: usize,
    pub session_restarts: u32,

    /// Website-bearing records in the record set
    pub total: usize,

    /// Offset to pass as `--start-from` to continue
    pub resume_from: usize,

    /// The run stopped on a shutdown signal
    pub interrupted: bool,
}

impl RunSummary {
    pub fn from_state(
        state: &CrawlState,
        total: usize,
        started_at: DateTime<Utc>,
        interrupted: bool,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            processed: state.processed_count,
            found: state.tally(OutcomeKind::Found),
            not_found: state.tally(OutcomeKind::NotFound),
            no_website: state.tally(OutcomeKind::NoWebsite),
            errors: state.error_count(),
            session_restarts: state.session_restart_count,
            total,
            resume_from: state.resume_from(),
            interrupted,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Returns true if every website-bearing record has been processed
    pub fn is_complete(&self) -> bool {
        self.resume_from >= self.total
    }
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");
    println!(
        "  Started:  {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Finished: {} ({}s)",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.duration_seconds()
    );
    println!("  Processed: {}", summary.processed);
    println!("  Emails found: {}", summary.found);
    println!("  No email found: {}", summary.not_found);
    println!("  No website: {}", summary.no_website);
    println!("  Errors: {}", summary.errors);
    println!("  Session restarts: {}", summary.session_restarts);
    println!();

    if summary.is_complete() {
        println!("All {} records with a website are processed.", summary.total);
    } else {
        if summary.interrupted {
            println!("Run interrupted.");
        }
        println!(
            "Resume with --start-from {} ({} of {} done).",
            summary.resume_from, summary.resume_from, summary.total
        );
    }
}
