use crate::state::outcome::{EmailOutcome, OutcomeKind};
use std::collections::HashMap;
use std::path::PathBuf;

/// Why the session manager replaced its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Too many error outcomes in a row
    ConsecutiveErrors,
    /// Fixed cadence to bound resource growth
    Routine,
    /// The session reported itself unusable
    Unhealthy,
}

impl std::fmt::Display for RestartReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ConsecutiveErrors => "consecutive errors",
            Self::Routine => "routine restart",
            Self::Unhealthy => "unhealthy session",
        };
        f.write_str(label)
    }
}

/// Progress of one run of the batch driver
///
/// Created when a run starts and dropped when it ends. Nothing here is
/// persisted; a resumed run reconstructs its position from the offset the
/// operator passes in.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Website-bearing records skipped at the start of this run
    pub start_from: usize,

    /// Records processed in this run
    pub processed_count: usize,

    /// Error outcomes since the last success or restart
    pub consecutive_error_count: u32,

    /// Session restarts performed in this run
    pub session_restart_count: u32,

    /// Where checkpoints are written
    pub output_destination: PathBuf,

    tallies: HashMap<OutcomeKind, usize>,
}

impl CrawlState {
    pub fn new(start_from: usize, output_destination: PathBuf) -> Self {
        Self {
            start_from,
            processed_count: 0,
            consecutive_error_count: 0,
            session_restart_count: 0,
            output_destination,
            tallies: HashMap::new(),
        }
    }

    /// Accounts for one processed record
    ///
    /// Error outcomes extend the consecutive error run, successful site
    /// searches end it, and `NoWebsite` leaves it alone.
    pub fn record_outcome(&mut self, outcome: &EmailOutcome) {
        self.processed_count += 1;
        *self.tallies.entry(outcome.kind()).or_insert(0) += 1;

        if outcome.is_error() {
            self.consecutive_error_count += 1;
        } else if outcome.is_success() {
            self.consecutive_error_count = 0;
        }
    }

    /// Accounts for a completed session restart
    pub fn record_restart(&mut self) {
        self.session_restart_count += 1;
        self.consecutive_error_count = 0;
    }

    /// Decides whether the session must be replaced after the last record
    ///
    /// When both triggers fire on the same record a single restart covers
    /// them, reported as the error-driven one.
    pub fn restart_due(&self, max_consecutive_errors: u32, restart_every: usize) -> Option<RestartReason> {
        if self.consecutive_error_count >= max_consecutive_errors {
            Some(RestartReason::ConsecutiveErrors)
        } else if self.processed_count > 0 && self.processed_count % restart_every == 0 {
            Some(RestartReason::Routine)
        } else {
            None
        }
    }

    /// Returns true if the record set should be persisted now
    ///
    /// # Arguments
    ///
    /// * `checkpoint_every` - Cadence in processed records
    /// * `total` - Number of website-bearing records in the whole set
    pub fn checkpoint_due(&self, checkpoint_every: usize, total: usize) -> bool {
        self.processed_count > 0
            && (self.processed_count % checkpoint_every == 0 || self.resume_from() >= total)
    }

    /// Offset to pass as `--start-from` to continue after this point
    pub fn resume_from(&self) -> usize {
        self.start_from + self.processed_count
    }

    /// Number of records that ended with the given outcome kind
    pub fn tally(&self, kind: OutcomeKind) -> usize {
        self.tallies.get(&kind).copied().unwrap_or(0)
    }

    /// Total error outcomes in this run
    pub fn error_count(&self) -> usize {
        self.tally(OutcomeKind::WebsiteUnreachable)
            + self.tally(OutcomeKind::Failed)
            + self.tally(OutcomeKind::ProcessingFailed)
    }
}
