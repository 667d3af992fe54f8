//! Session module for page rendering backends
//!
//! A session is the resource every page load goes through. The batch driver
//! owns exactly one at a time through `SessionManager`, and replaces it when
//! it degrades. Two backends exist:
//! - `http`: a plain `reqwest` client, no sub-resources and no scripting
//! - `chrome`: a headless Chromium driven over the DevTools protocol

mod chrome;
mod http;
mod manager;

#[cfg(test)]
pub(crate) mod scripted;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use http::{build_http_client, HttpSession, HttpSessionFactory};
pub use manager::SessionManager;

use crate::config::{SessionBackend, SessionConfig};
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch session: {0}")]
    Launch(String),

    #[error("Page load timed out after {0:?}")]
    Timeout(Duration),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Session disconnected: {0}")]
    Disconnected(String),
}

/// Lowest HTTP status that fails a page load
const ERROR_STATUS: u16 = 400;

/// Rejects a document whose main response carried an error status
///
/// Both backends apply this rule, so an error page is never searched for
/// addresses regardless of how it was rendered.
pub fn check_status(status: u16) -> Result<(), SessionError> {
    if status >= ERROR_STATUS {
        Err(SessionError::Navigation(format!("HTTP {}", status)))
    } else {
        Ok(())
    }
}

/// A page the session finished loading
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The URL navigation was asked for
    pub requested: Url,

    /// Where navigation ended after redirects
    pub final_url: Url,

    /// Serialized document markup
    pub content: String,
}

impl LoadedPage {
    pub fn new(requested: Url, final_url: Url, content: String) -> Self {
        Self {
            requested,
            final_url,
            content,
        }
    }

    /// Parses the content into a queryable document
    ///
    /// Parsing is lenient and never fails; malformed markup yields a
    /// best-effort tree.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.content)
    }

    /// Returns true if the content carries a root element
    pub fn has_root_element(&self) -> bool {
        let lower = self.content.to_ascii_lowercase();
        lower.contains("<html") || lower.contains("<body")
    }
}

/// A renderer-backed client that loads pages one at a time
#[async_trait]
pub trait Session: Send + Sync {
    /// Loads a URL and returns the resulting document
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to load
    /// * `timeout` - Budget for the whole load
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<LoadedPage, SessionError>;

    /// Returns false once the session can no longer load pages
    async fn is_healthy(&self) -> bool;

    /// Releases the underlying resources
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Produces fresh sessions for the session manager
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn Session>, SessionError>;

    /// Short backend name for log lines
    fn backend_name(&self) -> &'static str;
}

/// Builds the session factory selected by configuration
pub fn build_factory(config: &SessionConfig) -> Box<dyn SessionFactory> {
    match config.backend {
        SessionBackend::Http => Box::new(HttpSessionFactory::new(config.clone())),
        SessionBackend::Chrome => Box::new(ChromeSessionFactory::new(config.clone())),
    }
}
