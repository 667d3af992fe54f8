//! Page fetcher
//!
//! This module turns a session navigation into a typed result:
//! - Enforcing a hard deadline on top of the session's own timeout
//! - Rejecting documents with no recognizable root element
//! - Classifying every session error as a timeout or a navigation error

use crate::session::{LoadedPage, Session, SessionError};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum PageFetchResult {
    /// The page loaded and has a root element
    Success(LoadedPage),

    /// The deadline passed before the page finished loading
    Timeout,

    /// Transport fault, HTTP error status, non-HTML body or missing root element
    NavigationError(String),
}

impl PageFetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Consumes the result, keeping only a loaded page
    pub fn into_page(self) -> Option<LoadedPage> {
        match self {
            Self::Success(page) => Some(page),
            _ => None,
        }
    }
}

/// Loads a URL through the session within a deadline
///
/// The session receives the same timeout, and an outer deadline backs it up.
/// When the outer deadline fires the navigation future is dropped; whatever
/// the session started keeps running on its side and is not cancelled.
///
/// # Arguments
///
/// * `session` - The session to load with
/// * `url` - The URL to load
/// * `timeout` - Budget for the whole load
///
/// # Returns
///
/// A `PageFetchResult`; this function never fails
pub async fn fetch_page(session: &mut dyn Session, url: &Url, timeout: Duration) -> PageFetchResult {
    tracing::debug!("Fetching {} (timeout {:?})", url, timeout);

    match tokio::time::timeout(timeout, session.navigate(url, timeout)).await {
        Err(_) => {
            tracing::debug!("Deadline expired for {}", url);
            PageFetchResult::Timeout
        }
        Ok(Err(SessionError::Timeout(_))) => PageFetchResult::Timeout,
        Ok(Err(e)) => PageFetchResult::NavigationError(e.to_string()),
        Ok(Ok(page)) => {
            if page.has_root_element() {
                PageFetchResult::Success(page)
            } else {
                PageFetchResult::NavigationError(format!("no root element at {}", page.final_url))
            }
        }
    }
}
