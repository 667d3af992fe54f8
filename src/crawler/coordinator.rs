//! Batch driver - sequential, checkpointed email harvesting
//!
//! This module contains the main loop that walks the record set, including:
//! - Skipping records already handled by an earlier run
//! - Resolving each website through the orchestrator
//! - Restarting the session on error runs and on a fixed cadence
//! - Checkpointing on cadence and on every exit path
//! - Stopping cleanly on a shutdown signal

use crate::config::Config;
use crate::crawler::orchestrator::Orchestrator;
use crate::output::{CheckpointWriter, RunSummary};
use crate::session::{SessionFactory, SessionManager};
use crate::state::{CrawlState, EmailOutcome};
use crate::storage::RecordSet;
use crate::HarvestError;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Main batch driver structure
pub struct Coordinator {
    config: Config,
    orchestrator: Orchestrator,
    factory: Option<Box<dyn SessionFactory>>,
    records: RecordSet,
    checkpoint: CheckpointWriter,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `records` - The record set to fill in; outcomes are written in place
    /// * `checkpoint` - Writer for the output destination
    /// * `factory` - Source of browser sessions
    pub fn new(
        config: Config,
        records: RecordSet,
        checkpoint: CheckpointWriter,
        factory: Box<dyn SessionFactory>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(&config),
            config,
            factory: Some(factory),
            records,
            checkpoint,
        }
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Number of checkpoints written so far
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoint.save_count()
    }

    /// Runs to completion
    pub async fn run(&mut self, start_from: usize) -> crate::Result<RunSummary> {
        self.run_until(start_from, std::future::pending()).await
    }

    /// Runs until every record is processed or `shutdown` completes
    ///
    /// # Arguments
    ///
    /// * `start_from` - Number of website-bearing records to skip
    /// * `shutdown` - Resolves when the run should stop; a record in
    ///   progress at that moment is left without an outcome
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run completed or was interrupted
    /// * `Err(HarvestError::Aborted)` - No session could be created
    /// * `Err(HarvestError::Storage)` - The final checkpoint failed
    pub async fn run_until<F>(&mut self, start_from: usize, shutdown: F) -> crate::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let positions = self.records.website_positions();
        let total = positions.len();
        let mut state = CrawlState::new(start_from, self.checkpoint.destination().to_path_buf());

        if start_from >= total {
            tracing::info!(
                "Nothing to do: start offset {} covers all {} records with a website",
                start_from,
                total
            );
            self.checkpoint.save(&self.records)?;
            return Ok(RunSummary::from_state(&state, total, started_at, false));
        }

        let factory = self.factory.take().ok_or(HarvestError::NoSession)?;
        let mut sessions = match SessionManager::start(factory).await {
            Ok(sessions) => sessions,
            Err(e) => return Err(self.abort(&state, format!("session creation failed: {}", e))),
        };

        tracing::info!(
            "Processing {} records with a website, starting at {}",
            total - start_from,
            start_from
        );

        tokio::pin!(shutdown);
        let result = self
            .process_records(&positions, &mut sessions, &mut state, &mut shutdown)
            .await;
        sessions.shutdown().await;

        let interrupted = match result {
            Ok(interrupted) => interrupted,
            Err(e) => return Err(self.abort(&state, e.to_string())),
        };

        self.checkpoint.save(&self.records)?;
        let summary = RunSummary::from_state(&state, total, started_at, interrupted);
        tracing::info!(
            "Run finished: {} processed, {} found, {} errors, {} restarts",
            summary.processed,
            summary.found,
            summary.errors,
            summary.session_restarts
        );
        Ok(summary)
    }

    /// Walks the pending records; returns true if interrupted
    async fn process_records<F>(
        &mut self,
        positions: &[usize],
        sessions: &mut SessionManager,
        state: &mut CrawlState,
        shutdown: &mut std::pin::Pin<&mut F>,
    ) -> crate::Result<bool>
    where
        F: Future<Output = ()>,
    {
        let total = positions.len();
        let run_config = self.config.run.clone();

        for (offset, &position) in positions.iter().enumerate().skip(state.start_from) {
            let Some(record) = self.records.records().get(position) else {
                continue;
            };
            let website = record.website.clone();
            tracing::info!("Processing {} of {}: {}", offset + 1, total, record.label());

            let outcome = tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    tracing::warn!("Shutdown requested, stopping before record {} is finished", offset + 1);
                    return Ok(true);
                }
                outcome = resolve(&self.orchestrator, sessions, state, website.as_deref()) => outcome?,
            };

            tracing::info!("  -> {}", outcome);
            if let Some(record) = self.records.get_mut(position) {
                record.set_outcome(&outcome);
            }
            state.record_outcome(&outcome);

            if let Some(reason) = state.restart_due(run_config.max_consecutive_errors, run_config.restart_every) {
                sessions.restart(reason).await?;
                state.record_restart();
            }

            if state.checkpoint_due(run_config.checkpoint_every, total) {
                self.checkpoint.save_best_effort(&self.records);
            }

            let delay = run_config.politeness_delay();
            if offset + 1 < total && !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown.as_mut() => {
                        tracing::warn!("Shutdown requested");
                        return Ok(true);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Ok(false)
    }

    /// Saves what exists and builds the abort error
    fn abort(&mut self, state: &CrawlState, reason: String) -> HarvestError {
        tracing::error!("Aborting run: {}", reason);
        self.checkpoint.save_best_effort(&self.records);
        HarvestError::Aborted {
            resume_from: state.resume_from(),
            reason,
        }
    }
}

/// Resolves one website, converting any panic into an outcome
async fn resolve(
    orchestrator: &Orchestrator,
    sessions: &mut SessionManager,
    state: &mut CrawlState,
    website: Option<&str>,
) -> crate::Result<EmailOutcome> {
    if sessions.ensure_healthy().await? {
        state.record_restart();
    }
    let session = sessions.session().ok_or(HarvestError::NoSession)?;

    match AssertUnwindSafe(orchestrator.search(session, website))
        .catch_unwind()
        .await
    {
        Ok(outcome) => Ok(outcome),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!("Search panicked for {:?}: {}", website, message);
            Ok(EmailOutcome::processing_failed(message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
