//! Headless Chromium session backend
//!
//! `headless_chrome` is a blocking API, so every browser call is moved onto
//! the blocking pool. When the caller's deadline expires the blocking call
//! keeps running in the background; the browser is only torn down by
//! `close` or a restart.
//!
//! A load waits for navigation to finish before the document is read, and
//! the main response status is checked the same way the HTTP backend does.

use crate::config::SessionConfig;
use crate::session::{check_status, LoadedPage, Session, SessionError, SessionFactory};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Browsers are only closed explicitly, never for idling between records
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Status of the main document, or null when the browser does not expose it
const DOCUMENT_STATUS_SCRIPT: &str = r#"
    (() => {
        const nav = performance.getEntriesByType('navigation')[0];
        return nav && nav.responseStatus ? nav.responseStatus : null;
    })()
"#;

/// Blocking steps of one page load
trait PageDriver {
    fn start_navigation(&self, target: &str) -> anyhow::Result<()>;
    fn wait_until_loaded(&self) -> anyhow::Result<()>;
    fn wait_for_body(&self, timeout: Duration) -> anyhow::Result<()>;
    fn document_status(&self) -> anyhow::Result<Option<u16>>;
    fn content(&self) -> anyhow::Result<String>;
    fn current_url(&self) -> String;
}

impl PageDriver for Tab {
    fn start_navigation(&self, target: &str) -> anyhow::Result<()> {
        self.navigate_to(target)?;
        Ok(())
    }

    fn wait_until_loaded(&self) -> anyhow::Result<()> {
        self.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for_body(&self, timeout: Duration) -> anyhow::Result<()> {
        self.wait_for_element_with_custom_timeout("body", timeout)?;
        Ok(())
    }

    fn document_status(&self) -> anyhow::Result<Option<u16>> {
        let result = self.evaluate(DOCUMENT_STATUS_SCRIPT, false)?;
        Ok(result
            .value
            .as_ref()
            .and_then(|v| v.as_u64())
            .and_then(|status| u16::try_from(status).ok()))
    }

    fn content(&self) -> anyhow::Result<String> {
        self.get_content()
    }

    fn current_url(&self) -> String {
        self.get_url()
    }
}

/// Loads a page and returns its final URL and markup
fn load_document<D: PageDriver + ?Sized>(
    driver: &D,
    target: &str,
    timeout: Duration,
) -> Result<(String, String), SessionError> {
    let fail = |e: anyhow::Error| navigation_error(e, timeout);

    driver.start_navigation(target).map_err(fail)?;
    driver.wait_until_loaded().map_err(fail)?;
    driver.wait_for_body(timeout).map_err(fail)?;

    match driver.document_status() {
        Ok(Some(status)) => check_status(status)?,
        Ok(None) => {}
        Err(e) => tracing::debug!("Could not read document status for {}: {}", target, e),
    }

    let content = driver.content().map_err(fail)?;
    Ok((driver.current_url(), content))
}

/// Session backed by one browser with one tab
pub struct ChromeSession {
    browser: Option<Arc<Browser>>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    /// Launches a browser and opens its working tab
    pub fn launch(config: &SessionConfig) -> Result<Self, SessionError> {
        let args: Vec<OsString> = vec![
            OsString::from("--disable-dev-shm-usage"),
            OsString::from("--blink-settings=imagesEnabled=false"),
            OsString::from(format!("--user-agent={}", config.user_agent)),
        ];

        let options = LaunchOptions {
            headless: true,
            sandbox: false,
            path: config.chrome_path.as_ref().map(PathBuf::from),
            idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
            args: args.iter().map(|a| a.as_os_str()).collect(),
            ..Default::default()
        };

        let browser = Browser::new(options).map_err(launch_error)?;
        let tab = browser.new_tab().map_err(launch_error)?;
        tab.set_default_timeout(config.page_load_timeout());

        Ok(Self {
            browser: Some(Arc::new(browser)),
            tab: Some(tab),
        })
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<LoadedPage, SessionError> {
        let tab = self
            .tab
            .clone()
            .ok_or_else(|| SessionError::Disconnected("browser already closed".to_string()))?;
        let target = url.to_string();

        let (final_url, content) = tokio::task::spawn_blocking(move || {
            tab.set_default_timeout(timeout);
            load_document(&*tab, &target, timeout)
        })
        .await
        .map_err(|e| SessionError::Disconnected(format!("browser task failed: {}", e)))??;
        let final_url = Url::parse(&final_url).unwrap_or_else(|_| url.clone());

        Ok(LoadedPage::new(url.clone(), final_url, content))
    }

    async fn is_healthy(&self) -> bool {
        let Some(browser) = self.browser.clone() else {
            return false;
        };
        tokio::task::spawn_blocking(move || browser.get_version().is_ok())
            .await
            .unwrap_or(false)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let tab = self.tab.take();
        let browser = self.browser.take();

        // Dropping the last browser handle kills the process
        tokio::task::spawn_blocking(move || {
            if let Some(tab) = tab {
                if let Err(e) = tab.close(false) {
                    tracing::debug!("Failed to close tab: {}", e);
                }
            }
            drop(browser);
        })
        .await
        .map_err(|e| SessionError::Disconnected(e.to_string()))
    }
}

fn launch_error(error: anyhow::Error) -> SessionError {
    SessionError::Launch(error.to_string())
}

fn navigation_error(error: anyhow::Error, timeout: Duration) -> SessionError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        SessionError::Timeout(timeout)
    } else if lower.contains("connection") && lower.contains("closed") {
        SessionError::Disconnected(message)
    } else {
        SessionError::Navigation(message)
    }
}

/// Launches headless Chromium sessions
pub struct ChromeSessionFactory {
    config: SessionConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn create(&self) -> Result<Box<dyn Session>, SessionError> {
        let config = self.config.clone();
        let session = tokio::task::spawn_blocking(move || ChromeSession::launch(&config))
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))??;
        Ok(Box::new(session))
    }

    fn backend_name(&self) -> &'static str {
        "chrome"
    }
}
