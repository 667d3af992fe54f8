//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `EmailOutcome`: the terminal result written into each record's `Email` cell
//! - `CrawlState`: counters the batch driver uses for restarts and checkpoints

mod crawl_state;
mod outcome;

// Re-export main types
pub use crawl_state::{CrawlState, RestartReason};
pub use outcome::{EmailOutcome, OutcomeKind, NOT_FOUND, NO_WEBSITE, WEBSITE_UNREACHABLE};
