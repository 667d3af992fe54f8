//! HTTP session backend
//!
//! Loads the document only. Images, scripts and stylesheets are never
//! requested, which is the closest a plain client gets to a renderer with
//! images disabled.

use crate::config::SessionConfig;
use crate::session::{check_status, LoadedPage, Session, SessionError, SessionFactory};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with the configured identification string
///
/// # Arguments
///
/// * `config` - The session configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use contact_harvest::config::SessionConfig;
/// use contact_harvest::session::build_http_client;
///
/// let client = build_http_client(&SessionConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.page_load_timeout())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Session backed by a `reqwest` client
pub struct HttpSession {
    client: Client,
    closed: bool,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<LoadedPage, SessionError> {
        if self.closed {
            return Err(SessionError::Disconnected("session already closed".to_string()));
        }

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        check_status(response.status().as_u16())?;

        // A missing header is treated as HTML
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(SessionError::Navigation(format!(
                "non-HTML content type: {}",
                content_type
            )));
        }

        let final_url = response.url().clone();
        let content = response.text().await.map_err(|e| classify(e, timeout))?;

        Ok(LoadedPage::new(url.clone(), final_url, content))
    }

    async fn is_healthy(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> SessionError {
    if error.is_timeout() {
        SessionError::Timeout(timeout)
    } else {
        SessionError::Navigation(error.to_string())
    }
}

/// Creates HTTP sessions from a fixed configuration
pub struct HttpSessionFactory {
    config: SessionConfig,
}

impl HttpSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn create(&self) -> Result<Box<dyn Session>, SessionError> {
        let client =
            build_http_client(&self.config).map_err(|e| SessionError::Launch(e.to_string()))?;
        Ok(Box::new(HttpSession::new(client)))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = SessionConfig::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_error_status_page_is_rejected() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(
                b"<html><body>Not here. Footer: office@acme.com</body></html>".to_vec(),
                "text/html",
            ))
            .mount(&server)
            .await;

        let factory = HttpSessionFactory::new(SessionConfig::default());
        let mut session = factory.create().await.unwrap();
        let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();

        let result = session.navigate(&url, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(SessionError::Navigation(m)) if m == "HTTP 404"));
    }

    #[tokio::test]
    async fn test_closed_session_refuses_navigation() {
        let factory = HttpSessionFactory::new(SessionConfig::default());
        let mut session = factory.create().await.unwrap();
        assert!(session.is_healthy().await);

        session.close().await.unwrap();
        assert!(!session.is_healthy().await);

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = session.navigate(&url, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(SessionError::Disconnected(_))));
    }
}
