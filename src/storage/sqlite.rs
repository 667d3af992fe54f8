//! SQLite record store
//!
//! Records are written to a single `businesses` table. Every column is TEXT
//! except `row_index`, which keeps the original record order. A database
//! without that table is read from its only table instead.

use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::RecordSet;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Table holding the business records
pub const TABLE_NAME: &str = "businesses";

const ROW_INDEX_COLUMN: &str = "row_index";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Picks the table to read: `businesses`, or else the only table present
    fn source_table(&self) -> StorageResult<String> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        if tables.iter().any(|t| t == TABLE_NAME) {
            return Ok(TABLE_NAME.to_string());
        }
        match tables.as_slice() {
            [only] => {
                tracing::debug!("No {} table in {}, reading {}", TABLE_NAME, self.path.display(), only);
                Ok(only.clone())
            }
            [] => Err(StorageError::Format(format!(
                "{} has no tables",
                self.path.display()
            ))),
            _ => Err(StorageError::Format(format!(
                "{} has no {} table and {} candidate tables",
                self.path.display(),
                TABLE_NAME,
                tables.len()
            ))),
        }
    }
}

impl RecordStore for SqliteStore {
    fn load(&mut self) -> StorageResult<RecordSet> {
        let table = quote_identifier(&self.source_table()?);

        let order = if column_names(&self.conn, &table)?.iter().any(|c| c == ROW_INDEX_COLUMN) {
            format!(" ORDER BY {}", ROW_INDEX_COLUMN)
        } else {
            String::new()
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}{}", table, order))?;

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let keep: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != ROW_INDEX_COLUMN)
            .map(|(i, _)| i)
            .collect();
        let headers = keep.iter().map(|&i| names[i].clone()).collect();

        let rows = stmt
            .query_map([], |row| {
                keep.iter()
                    .map(|&i| row.get_ref(i).map(cell_text))
                    .collect::<Result<Vec<String>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Read {} rows from {}", rows.len(), self.path.display());
        RecordSet::from_rows(headers, rows)
    }

    fn save(&mut self, records: &RecordSet) -> StorageResult<()> {
        let columns = sql_columns(records.headers());
        let create = format!(
            "CREATE TABLE {} ({} INTEGER PRIMARY KEY, {})",
            TABLE_NAME,
            ROW_INDEX_COLUMN,
            columns
                .iter()
                .map(|c| format!("{} TEXT", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let insert = format!(
            "INSERT INTO {} ({}, {}) VALUES ({})",
            TABLE_NAME,
            ROW_INDEX_COLUMN,
            columns.join(", "),
            (1..=columns.len() + 1)
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", TABLE_NAME))?;
        tx.execute(&create, [])?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for (index, row) in records.to_rows().into_iter().enumerate() {
                let mut values = Vec::with_capacity(row.len() + 1);
                values.push(Value::Integer(index as i64));
                values.extend(row.into_iter().map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(cell)
                    }
                }));
                stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

fn column_names(conn: &Connection, table: &str) -> StorageResult<Vec<String>> {
    let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", table))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// Quoted, unique column identifiers for a header row
fn sql_columns(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    seen.insert(ROW_INDEX_COLUMN.to_string());

    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let mut name = if header.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                header.clone()
            };
            while !seen.insert(name.to_lowercase()) {
                name.push('_');
            }
            quote_identifier(&name)
        })
        .collect()
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
