//! Storage traits and error types
//!
//! A record store moves a whole `RecordSet` between memory and one file.
//! The batch driver never sees rows or connections, only this trait.

use crate::storage::RecordSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed record file: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store backends
///
/// Each store is bound to a single file. `save` replaces the file contents
/// with the full record set.
pub trait RecordStore: Send {
    /// Reads every record from the backing file
    fn load(&mut self) -> StorageResult<RecordSet>;

    /// Writes every record to the backing file
    ///
    /// A failed save must leave the previous contents readable.
    fn save(&mut self, records: &RecordSet) -> StorageResult<()>;

    /// The file this store reads and writes
    fn path(&self) -> &std::path::Path;
}
