//! CSV record store
//!
//! Saves go through a sibling temporary file that is renamed over the
//! destination, so an interrupted write never truncates a checkpoint.

use crate::storage::traits::{RecordStore, StorageResult};
use crate::storage::RecordSet;
use std::path::{Path, PathBuf};

/// CSV file backend
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl RecordStore for CsvStore {
    fn load(&mut self) -> StorageResult<RecordSet> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(String::from).collect());
        }

        tracing::debug!("Read {} rows from {}", rows.len(), self.path.display());
        RecordSet::from_rows(headers, rows)
    }

    fn save(&mut self, records: &RecordSet) -> StorageResult<()> {
        let temp = self.temp_path();

        {
            let mut writer = csv::Writer::from_path(&temp)?;
            writer.write_record(records.headers())?;
            for row in records.to_rows() {
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }

        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
