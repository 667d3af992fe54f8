//! In-memory record set
//!
//! The record set is the single source of truth during a run. Stores only
//! translate it to and from rows; the batch driver mutates records in place
//! and hands the whole set to the checkpoint writer.

use crate::state::EmailOutcome;
use crate::storage::traits::{StorageError, StorageResult};

/// Header of the required website column
pub const WEBSITE_COLUMN: &str = "Website";

/// Header of the optional display-name column
pub const NAME_COLUMN: &str = "Name";

/// Header of the outcome column, appended when absent
pub const EMAIL_COLUMN: &str = "Email";

/// What a column position holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Name,
    Website,
    Email,
    /// Pass-through cell, index into `BusinessRecord::extra`
    Extra(usize),
}

/// One business from the directory
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessRecord {
    /// Stable ordinal in the input set
    pub index: usize,
    pub name: Option<String>,
    /// Raw website cell; `None` when the cell is empty
    pub website: Option<String>,
    /// Pass-through cells, in column order
    pub extra: Vec<String>,
    email: Option<String>,
    email_written: bool,
}

impl BusinessRecord {
    pub fn new(index: usize, name: Option<String>, website: Option<String>) -> Self {
        Self {
            index,
            name,
            website,
            extra: Vec::new(),
            email: None,
            email_written: false,
        }
    }

    /// Returns true if the record carries any website value
    ///
    /// Only empty cells count as missing here; a whitespace-only value is
    /// still website-bearing and resolves to `NoWebsite` when searched.
    pub fn has_website(&self) -> bool {
        self.website.is_some()
    }

    /// Current `Email` cell value
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Current cell value interpreted as an outcome
    pub fn outcome(&self) -> Option<EmailOutcome> {
        self.email.as_deref().and_then(EmailOutcome::from_cell)
    }

    /// Display label for progress lines
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Writes a terminal outcome into the `Email` cell
    ///
    /// A record accepts one outcome per run. Returns false, leaving the cell
    /// unchanged, if an outcome was already written in this run.
    pub fn set_outcome(&mut self, outcome: &EmailOutcome) -> bool {
        if self.email_written {
            tracing::warn!(
                "Refusing to overwrite outcome for record {} ({})",
                self.index,
                self.label()
            );
            return false;
        }
        self.email = Some(outcome.to_cell_string());
        self.email_written = true;
        true
    }
}

/// Ordered collection of business records plus their column layout
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    headers: Vec<String>,
    roles: Vec<ColumnRole>,
    records: Vec<BusinessRecord>,
}

impl RecordSet {
    /// Builds a record set from a header row and data rows
    ///
    /// Rows shorter than the header are padded with empty cells. An `Email`
    /// column is appended if the header has none.
    ///
    /// # Errors
    ///
    /// * `StorageError::MissingColumn` - No `Website` column
    /// * `StorageError::Format` - A row has more cells than the header
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> StorageResult<Self> {
        let mut headers = headers;
        let mut roles = Vec::with_capacity(headers.len() + 1);
        let mut extra_count = 0;

        for header in &headers {
            let role = match header.trim() {
                h if h.eq_ignore_ascii_case(WEBSITE_COLUMN) && !roles.contains(&ColumnRole::Website) => {
                    ColumnRole::Website
                }
                h if h.eq_ignore_ascii_case(NAME_COLUMN) && !roles.contains(&ColumnRole::Name) => {
                    ColumnRole::Name
                }
                h if h.eq_ignore_ascii_case(EMAIL_COLUMN) && !roles.contains(&ColumnRole::Email) => {
                    ColumnRole::Email
                }
                _ => {
                    extra_count += 1;
                    ColumnRole::Extra(extra_count - 1)
                }
            };
            roles.push(role);
        }

        if !roles.contains(&ColumnRole::Website) {
            return Err(StorageError::MissingColumn(WEBSITE_COLUMN.to_string()));
        }

        let width = headers.len();
        if !roles.contains(&ColumnRole::Email) {
            headers.push(EMAIL_COLUMN.to_string());
            roles.push(ColumnRole::Email);
        }

        let mut records = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(StorageError::Format(format!(
                    "row {} has {} cells but the header has {}",
                    index + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, String::new());

            let mut record = BusinessRecord::new(index, None, None);
            record.extra = vec![String::new(); extra_count];
            for (cell, role) in row.into_iter().zip(roles.iter()) {
                match role {
                    ColumnRole::Name => record.name = non_empty(cell),
                    ColumnRole::Website => record.website = non_empty(cell),
                    ColumnRole::Email => record.email = non_empty(cell),
                    ColumnRole::Extra(i) => record.extra[*i] = cell,
                }
            }
            records.push(record);
        }

        Ok(Self {
            headers,
            roles,
            records,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut BusinessRecord> {
        self.records.get_mut(position)
    }

    /// Positions of website-bearing records, in original order
    ///
    /// The resume offset indexes into this list, not into the raw rows.
    pub fn website_positions(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.has_website())
            .map(|(position, _)| position)
            .collect()
    }

    /// Renders every record as a row in header order
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                self.roles
                    .iter()
                    .map(|role| match role {
                        ColumnRole::Name => record.name.clone().unwrap_or_default(),
                        ColumnRole::Website => record.website.clone().unwrap_or_default(),
                        ColumnRole::Email => record.email.clone().unwrap_or_default(),
                        ColumnRole::Extra(i) => record.extra.get(*i).cloned().unwrap_or_default(),
                    })
                    .collect()
            })
            .collect()
    }
}

fn non_empty(cell: String) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell)
    }
}
