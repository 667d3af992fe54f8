//! Terminal outcomes written into a record's `Email` cell
//!
//! Every processed record ends in exactly one of these. The cell rendering is
//! part of the output format and must stay stable across versions, since a
//! resumed run reads earlier outcomes back from the checkpoint.

use std::fmt;

/// Cell text for a record with no usable website
pub const NO_WEBSITE: &str = "No website URL provided";

/// Cell text when neither the site nor its `www.` variant loaded
pub const WEBSITE_UNREACHABLE: &str = "Website timeout or error";

/// Cell text when every heuristic was exhausted
pub const NOT_FOUND: &str = "No email found on website";

const FAILED_PREFIX: &str = "Error: ";
const PROCESSING_FAILED_PREFIX: &str = "Error processing: ";

const FAILED_MESSAGE_LIMIT: usize = 100;
const PROCESSING_FAILED_MESSAGE_LIMIT: usize = 50;

/// The terminal result of searching one business website
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmailOutcome {
    // ===== Success States =====
    /// A contact address was found
    Found(String),

    /// The site loaded but no heuristic produced an address
    NotFound,

    // ===== Input States =====
    /// The record has no usable website value
    NoWebsite,

    // ===== Error States =====
    /// The main page and its `www.` variant both failed to load
    WebsiteUnreachable,

    /// A fault inside the site search, already truncated for the cell
    Failed(String),

    /// A fault that escaped the site search, already truncated for the cell
    ProcessingFailed(String),
}

/// Outcome discriminant, used for tallies and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeKind {
    Found,
    NotFound,
    NoWebsite,
    WebsiteUnreachable,
    Failed,
    ProcessingFailed,
}

impl EmailOutcome {
    /// Builds a `Failed` outcome, keeping the first 100 characters
    pub fn failed(message: impl AsRef<str>) -> Self {
        Self::Failed(truncate_chars(message.as_ref(), FAILED_MESSAGE_LIMIT))
    }

    /// Builds a `ProcessingFailed` outcome, keeping the first 50 characters
    pub fn processing_failed(message: impl AsRef<str>) -> Self {
        Self::ProcessingFailed(truncate_chars(
            message.as_ref(),
            PROCESSING_FAILED_MESSAGE_LIMIT,
        ))
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Found(_) => OutcomeKind::Found,
            Self::NotFound => OutcomeKind::NotFound,
            Self::NoWebsite => OutcomeKind::NoWebsite,
            Self::WebsiteUnreachable => OutcomeKind::WebsiteUnreachable,
            Self::Failed(_) => OutcomeKind::Failed,
            Self::ProcessingFailed(_) => OutcomeKind::ProcessingFailed,
        }
    }

    /// Returns true if the site search itself went wrong
    ///
    /// These outcomes count toward the consecutive-error session restart.
    /// `NoWebsite` is an input problem and never touches the session.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::WebsiteUnreachable | Self::Failed(_) | Self::ProcessingFailed(_)
        )
    }

    /// Returns true if the session completed a full site search
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Found(_) | Self::NotFound)
    }

    /// The found address, if any
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Found(address) => Some(address),
            _ => None,
        }
    }

    /// Renders the outcome as the `Email` cell value
    pub fn to_cell_string(&self) -> String {
        match self {
            Self::Found(address) => address.clone(),
            Self::NotFound => NOT_FOUND.to_string(),
            Self::NoWebsite => NO_WEBSITE.to_string(),
            Self::WebsiteUnreachable => WEBSITE_UNREACHABLE.to_string(),
            Self::Failed(message) => format!("{}{}", FAILED_PREFIX, message),
            Self::ProcessingFailed(message) => format!("{}{}", PROCESSING_FAILED_PREFIX, message),
        }
    }

    /// Parses an `Email` cell value back into an outcome
    ///
    /// Returns None for empty cells and for values that are neither an
    /// outcome string nor an email address (for example a contact form link
    /// left behind by the directory scraper).
    pub fn from_cell(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        match cell {
            "" => None,
            NO_WEBSITE => Some(Self::NoWebsite),
            WEBSITE_UNREACHABLE => Some(Self::WebsiteUnreachable),
            NOT_FOUND => Some(Self::NotFound),
            _ => {
                // Longer prefix first: "Error processing: " also starts with "Error"
                if let Some(message) = cell.strip_prefix(PROCESSING_FAILED_PREFIX) {
                    Some(Self::ProcessingFailed(message.to_string()))
                } else if let Some(message) = cell.strip_prefix(FAILED_PREFIX) {
                    Some(Self::Failed(message.to_string()))
                } else if crate::crawler::looks_like_email(cell) {
                    Some(Self::Found(cell.to_string()))
                } else {
                    None
                }
            }
        }
    }
}

impl OutcomeKind {
    /// Returns all outcome kinds in display order
    pub fn all_kinds() -> Vec<Self> {
        vec![
            Self::Found,
            Self::NotFound,
            Self::NoWebsite,
            Self::WebsiteUnreachable,
            Self::Failed,
            Self::ProcessingFailed,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::NoWebsite => "no_website",
            Self::WebsiteUnreachable => "website_unreachable",
            Self::Failed => "failed",
            Self::ProcessingFailed => "processing_failed",
        }
    }
}

impl fmt::Display for EmailOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cell_string())
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn truncate_chars(message: &str, limit: usize) -> String {
    message.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_strings() {
        assert_eq!(
            EmailOutcome::Found("info@acme.com".to_string()).to_cell_string(),
            "info@acme.com"
        );
        assert_eq!(EmailOutcome::NoWebsite.to_cell_string(), "No website URL provided");
        assert_eq!(
            EmailOutcome::WebsiteUnreachable.to_cell_string(),
            "Website timeout or error"
        );
        assert_eq!(EmailOutcome::NotFound.to_cell_string(), "No email found on website");
        assert_eq!(
            EmailOutcome::failed("boom").to_cell_string(),
            "Error: boom"
        );
        assert_eq!(
            EmailOutcome::processing_failed("boom").to_cell_string(),
            "Error processing: boom"
        );
    }

    #[test]
    fn test_failed_truncates_to_100_chars() {
        let long = "x".repeat(250);
        let outcome = EmailOutcome::failed(&long);
        assert_eq!(outcome.to_cell_string().len(), "Error: ".len() + 100);
    }

    #[test]
    fn test_processing_failed_truncates_to_50_chars() {
        let long = "y".repeat(80);
        match EmailOutcome::processing_failed(&long) {
            EmailOutcome::ProcessingFailed(message) => assert_eq!(message.len(), 50),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(120);
        match EmailOutcome::failed(&long) {
            EmailOutcome::Failed(message) => assert_eq!(message.chars().count(), 100),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_from_cell() {
        assert_eq!(EmailOutcome::from_cell(""), None);
        assert_eq!(
            EmailOutcome::from_cell("No website URL provided"),
            Some(EmailOutcome::NoWebsite)
        );
        assert_eq!(
            EmailOutcome::from_cell("No email found on website"),
            Some(EmailOutcome::NotFound)
        );
        assert_eq!(
            EmailOutcome::from_cell("Website timeout or error"),
            Some(EmailOutcome::WebsiteUnreachable)
        );
        assert_eq!(
            EmailOutcome::from_cell("Error processing: bad"),
            Some(EmailOutcome::ProcessingFailed("bad".to_string()))
        );
        assert_eq!(
            EmailOutcome::from_cell("Error: bad"),
            Some(EmailOutcome::Failed("bad".to_string()))
        );
        assert_eq!(
            EmailOutcome::from_cell("sales@widgets.com"),
            Some(EmailOutcome::Found("sales@widgets.com".to_string()))
        );
        assert_eq!(
            EmailOutcome::from_cell("https://directory.example/send-email/42"),
            None
        );
    }

    #[test]
    fn test_is_error() {
        assert!(EmailOutcome::WebsiteUnreachable.is_error());
        assert!(EmailOutcome::failed("x").is_error());
        assert!(EmailOutcome::processing_failed("x").is_error());

        assert!(!EmailOutcome::NoWebsite.is_error());
        assert!(!EmailOutcome::NotFound.is_error());
        assert!(!EmailOutcome::Found("a@b.co".to_string()).is_error());
    }

    #[test]
    fn test_is_success() {
        assert!(EmailOutcome::NotFound.is_success());
        assert!(EmailOutcome::Found("a@b.co".to_string()).is_success());
        assert!(!EmailOutcome::NoWebsite.is_success());
        assert!(!EmailOutcome::WebsiteUnreachable.is_success());
    }

    #[test]
    fn test_all_kinds_unique_labels() {
        let kinds = OutcomeKind::all_kinds();
        let mut labels: Vec<_> = kinds.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), kinds.len());
    }
}
