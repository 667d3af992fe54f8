//! Configuration module for Contact-Harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so a run without a file uses
//! `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use contact_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Main page timeout: {}ms", config.crawl.main_page_timeout_ms);
//! ```

mod parser;
mod types;
mod validation;

use std::time::Duration;

// Re-export types
pub use types::{
    Config, CrawlConfig, ExtractionConfig, RunConfig, SessionBackend, SessionConfig,
    DEFAULT_CONTACT_PATHS, DEFAULT_PLACEHOLDER_DOMAINS, DEFAULT_PLACEHOLDER_LOCAL_PARTS,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

impl SessionConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }
}

impl CrawlConfig {
    pub fn main_page_timeout(&self) -> Duration {
        Duration::from_millis(self.main_page_timeout_ms)
    }

    pub fn secondary_timeout(&self) -> Duration {
        Duration::from_millis(self.secondary_timeout_ms)
    }
}

impl RunConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}
