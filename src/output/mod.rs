//! Output module for checkpoints and reports
//!
//! This module handles:
//! - Writing checkpoints of the record set to the output store
//! - Computing outcome statistics from a record set
//! - Summarizing a finished or interrupted run

mod checkpoint;
pub mod stats;

pub use checkpoint::CheckpointWriter;
pub use stats::{
    collect_statistics, print_run_summary, print_statistics, OutcomeStatistics, RunSummary,
};
