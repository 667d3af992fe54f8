use serde::Deserialize;

/// Identification string presented by every session
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

/// Paths probed on every site, in priority order
pub const DEFAULT_CONTACT_PATHS: &[&str] = &[
    "/contact",
    "/contact-us",
    "/about/contact",
    "/about-us/contact",
    "/contactus",
    "/about",
    "/about-us",
    "/connect",
    "/get-in-touch",
    "/support",
    "/help",
    "/reach-us",
];

/// Domain fragments that mark an address as a template placeholder
pub const DEFAULT_PLACEHOLDER_DOMAINS: &[&str] = &["example.com", "yourdomain.com", "domain.com"];

/// Local parts that mark an address as a template placeholder
pub const DEFAULT_PLACEHOLDER_LOCAL_PARTS: &[&str] = &["email", "user", "name", "someone"];

/// Main configuration structure for Contact-Harvest
///
/// Every section and key is optional; a missing file is equivalent to
/// `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Which renderer backs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Plain HTTP client, no script execution
    #[default]
    Http,
    /// Headless Chromium
    Chrome,
}

/// Session (renderer) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub backend: SessionBackend,

    /// Identification string sent with every request
    pub user_agent: String,

    /// Upper bound on any single page load (milliseconds)
    pub page_load_timeout_ms: u64,

    /// Explicit Chromium binary; auto-detected when absent
    pub chrome_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Http,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_load_timeout_ms: 20_000,
            chrome_path: None,
        }
    }
}

/// Per-site search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Deadline for the main page fetch (milliseconds)
    pub main_page_timeout_ms: u64,

    /// Deadline for `www.` fallback, contact path and discovered link fetches
    pub secondary_timeout_ms: u64,

    /// Candidate contact page paths, probed in order
    pub contact_paths: Vec<String>,

    /// How many contact-like links from the main page are followed
    pub max_discovered_links: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            main_page_timeout_ms: 20_000,
            secondary_timeout_ms: 15_000,
            contact_paths: DEFAULT_CONTACT_PATHS.iter().map(|p| p.to_string()).collect(),
            max_discovered_links: 2,
        }
    }
}

/// Placeholder filtering for text-matched addresses
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    pub placeholder_domains: Vec<String>,
    pub placeholder_local_parts: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            placeholder_domains: DEFAULT_PLACEHOLDER_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            placeholder_local_parts: DEFAULT_PLACEHOLDER_LOCAL_PARTS
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

/// Batch driver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Persist the record set after this many processed records
    pub checkpoint_every: usize,

    /// Restart the session after this many consecutive error outcomes
    pub max_consecutive_errors: u32,

    /// Restart the session after every this many processed records
    pub restart_every: usize,

    /// Pause between records (milliseconds)
    pub politeness_delay_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: 3,
            max_consecutive_errors: 3,
            restart_every: 20,
            politeness_delay_ms: 2_000,
        }
    }
}
