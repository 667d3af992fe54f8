//! Checkpoint writer
//!
//! A checkpoint is the whole record set written to the output store. The
//! output store doubles as the resume source for a later run.

use crate::storage::{open_store, RecordSet, RecordStore, StorageResult};
use std::path::Path;

/// Persists the record set to the output destination
pub struct CheckpointWriter {
    store: Box<dyn RecordStore>,
    saves: usize,
}

impl CheckpointWriter {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self { store, saves: 0 }
    }

    /// Opens the store matching the destination's extension
    ///
    /// # Arguments
    ///
    /// * `destination` - Output file; overwritten on every save
    pub fn open(destination: &Path) -> StorageResult<Self> {
        Ok(Self::new(open_store(destination)?))
    }

    pub fn destination(&self) -> &Path {
        self.store.path()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Overwrites the destination with the full record set
    pub fn save(&mut self, records: &RecordSet) -> StorageResult<()> {
        self.store.save(records)?;
        self.saves += 1;
        tracing::info!(
            "Checkpoint saved to {} ({} records)",
            self.destination().display(),
            records.len()
        );
        Ok(())
    }

    /// Saves on an error path, where a failure must not mask the original error
    pub fn save_best_effort(&mut self, records: &RecordSet) {
        if let Err(e) = self.save(records) {
            tracing::error!(
                "Failed to save checkpoint to {}: {}",
                self.destination().display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EmailOutcome;
    use crate::storage::load_records;
    use tempfile::TempDir;

    fn records() -> RecordSet {
        RecordSet::from_rows(
            vec!["Name".to_string(), "Website".to_string()],
            vec![vec!["Acme".to_string(), "acme.com".to_string()]],
        )
        .unwrap()
    }

    #[test]
    fn test_save_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.csv");
        let mut writer = CheckpointWriter::open(&destination).unwrap();

        let mut set = records();
        writer.save(&set).unwrap();
        set.get_mut(0).unwrap().set_outcome(&EmailOutcome::NotFound);
        writer.save(&set).unwrap();

        assert_eq!(writer.save_count(), 2);
        let loaded = load_records(&destination).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].outcome(), Some(EmailOutcome::NotFound));
    }

    #[test]
    fn test_sqlite_destination() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.sqlite");
        let mut writer = CheckpointWriter::open(&destination).unwrap();

        writer.save(&records()).unwrap();
        assert_eq!(load_records(&destination).unwrap().len(), 1);
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("missing-dir").join("out.csv");
        let mut writer = CheckpointWriter::open(&destination).unwrap();

        writer.save_best_effort(&records());
        assert_eq!(writer.save_count(), 0);
        assert!(!destination.exists());
    }
}
