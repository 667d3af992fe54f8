//! Storage module for business record files
//!
//! This module loads the business directory and writes checkpoints of it:
//! - `RecordSet` / `BusinessRecord`: the in-memory table
//! - `CsvStore`: comma-separated files, replaced atomically on save
//! - `SqliteStore`: a `businesses` table inside a SQLite database
//!
//! The backend is picked from the file extension.

mod csv_store;
mod records;
mod sqlite;
mod traits;

pub use csv_store::CsvStore;
pub use records::{BusinessRecord, ColumnRole, RecordSet, EMAIL_COLUMN, NAME_COLUMN, WEBSITE_COLUMN};
pub use sqlite::{SqliteStore, TABLE_NAME};
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::{Path, PathBuf};

const SQLITE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

/// Suffix inserted before the extension of the default output file
pub const OUTPUT_SUFFIX: &str = "_updated_emails";

/// Returns true if the path names a SQLite record file
pub fn is_sqlite_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SQLITE_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Opens the record store matching the file extension
///
/// # Arguments
///
/// * `path` - Record file; `.db`, `.sqlite` and `.sqlite3` select SQLite,
///   anything else is treated as CSV
pub fn open_store(path: &Path) -> StorageResult<Box<dyn RecordStore>> {
    if is_sqlite_path(path) {
        Ok(Box::new(SqliteStore::open(path)?))
    } else {
        Ok(Box::new(CsvStore::new(path)))
    }
}

/// Loads an existing record file
///
/// # Returns
///
/// * `Ok(RecordSet)` - Records in file order
/// * `Err(StorageError::NotFound)` - The file does not exist
pub fn load_records(path: &Path) -> StorageResult<RecordSet> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    open_store(path)?.load()
}

/// Derives the default output path for an input file
///
/// `leads.csv` becomes `leads_updated_emails.csv` in the same directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };
    input.with_file_name(name)
}

/// Picks the file a run loads its records from
///
/// A resumed run (`start_from > 0`) reads the existing output so outcomes
/// from earlier runs survive; every other run reads the input.
pub fn resume_source<'a>(input: &'a Path, output: &'a Path, start_from: usize) -> &'a Path {
    if start_from > 0 && output.exists() {
        output
    } else {
        input
    }
}
