//! Per-website email search
//!
//! The search walks a fixed sequence of stages, cheapest first:
//!
//! | Stage | Action | Next on success | Next on failure |
//! |-------|--------|-----------------|-----------------|
//! | Init | normalize the website | MainPage | NoWebsite |
//! | MainPage | load the site | MailtoCheck | WwwFallback or unreachable |
//! | WwwFallback | load the `www.` variant | MailtoCheck | unreachable |
//! | MailtoCheck | mailto links on the main page | Found | TextCheck |
//! | TextCheck | pattern match on the main page | Found | ContactPaths |
//! | ContactPaths | guessed contact pages | Found | DiscoveredLinks |
//! | DiscoveredLinks | contact-like links on the main page | Found | NotFound |
//!
//! Secondary page failures are skipped. Faults inside the search become a
//! `Failed` outcome; the caller always gets an `EmailOutcome`.

use crate::config::{Config, CrawlConfig};
use crate::crawler::extractor::{
    extract_email, extract_from_text, extract_mailto, find_contact_links, EmailCandidate,
    PlaceholderFilter, Provenance,
};
use crate::crawler::fetcher::{fetch_page, PageFetchResult};
use crate::session::{LoadedPage, Session};
use crate::state::EmailOutcome;
use crate::url::{contact_url, normalize_website, www_variant};
use std::time::Duration;
use url::Url;

#[derive(Debug)]
enum Stage {
    Init,
    MainPage(Url),
    WwwFallback(Url),
    MailtoCheck(LoadedPage),
    TextCheck(LoadedPage),
    ContactPaths(LoadedPage),
    DiscoveredLinks(LoadedPage),
}

/// Searches one business website for a contact address
#[derive(Debug, Clone)]
pub struct Orchestrator {
    crawl: CrawlConfig,
    filter: PlaceholderFilter,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        Self {
            crawl: config.crawl.clone(),
            filter: PlaceholderFilter::from_config(&config.extraction),
        }
    }

    /// Resolves a website value to a terminal outcome
    ///
    /// # Arguments
    ///
    /// * `session` - The session to load pages with
    /// * `website` - Raw `Website` cell, if any
    ///
    /// # Returns
    ///
    /// The record's outcome. Internal faults are reported as
    /// `EmailOutcome::Failed` with the message cut to 100 characters.
    pub async fn search(&self, session: &mut dyn Session, website: Option<&str>) -> EmailOutcome {
        match self.run_stages(session, website).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Search failed for {:?}: {}", website, e);
                EmailOutcome::failed(e.to_string())
            }
        }
    }

    async fn run_stages(
        &self,
        session: &mut dyn Session,
        website: Option<&str>,
    ) -> crate::Result<EmailOutcome> {
        let mut stage = Stage::Init;

        loop {
            stage = match stage {
                Stage::Init => {
                    let Some(raw) = website.map(str::trim).filter(|w| !w.is_empty()) else {
                        return Ok(EmailOutcome::NoWebsite);
                    };
                    match normalize_website(Some(raw)) {
                        Ok(url) => Stage::MainPage(url),
                        Err(e) => {
                            return Ok(EmailOutcome::failed(format!(
                                "invalid website URL {}: {}",
                                raw, e
                            )))
                        }
                    }
                }

                Stage::MainPage(url) => {
                    tracing::debug!("Loading main page {}", url);
                    match fetch_page(session, &url, self.crawl.main_page_timeout()).await {
                        PageFetchResult::Success(page) => Stage::MailtoCheck(page),
                        failure => {
                            tracing::warn!("Main page {} failed: {}", url, describe(&failure));
                            match www_variant(&url) {
                                Some(variant) => Stage::WwwFallback(variant),
                                None => return Ok(EmailOutcome::WebsiteUnreachable),
                            }
                        }
                    }
                }

                Stage::WwwFallback(url) => {
                    tracing::debug!("Trying www variant {}", url);
                    match fetch_page(session, &url, self.crawl.secondary_timeout()).await {
                        PageFetchResult::Success(page) => Stage::MailtoCheck(page),
                        failure => {
                            tracing::warn!("www variant {} failed: {}", url, describe(&failure));
                            return Ok(EmailOutcome::WebsiteUnreachable);
                        }
                    }
                }

                Stage::MailtoCheck(page) => match extract_mailto(&page) {
                    Some(candidate) => return Ok(found(candidate)),
                    None => Stage::TextCheck(page),
                },

                Stage::TextCheck(page) => match extract_from_text(&page.content, &self.filter) {
                    Some(candidate) => return Ok(found(candidate)),
                    None => Stage::ContactPaths(page),
                },

                Stage::ContactPaths(page) => {
                    for path in &self.crawl.contact_paths {
                        let url = contact_url(&page.final_url, path)?;
                        if let Some(candidate) = self.search_secondary(session, &url).await {
                            return Ok(found(candidate.with_provenance(Provenance::ContactPage)));
                        }
                    }
                    Stage::DiscoveredLinks(page)
                }

                Stage::DiscoveredLinks(page) => {
                    let links = find_contact_links(&page, self.crawl.max_discovered_links);
                    tracing::debug!("Found {} contact-like links on {}", links.len(), page.final_url);
                    for url in links {
                        if let Some(candidate) = self.search_secondary(session, &url).await {
                            return Ok(found(candidate.with_provenance(Provenance::DiscoveredLink)));
                        }
                    }
                    return Ok(EmailOutcome::NotFound);
                }
            };
        }
    }

    /// Loads a secondary page and runs both extractors on it
    async fn search_secondary(&self, session: &mut dyn Session, url: &Url) -> Option<EmailCandidate> {
        let result = fetch_page(session, url, self.secondary_timeout()).await;
        if !result.is_success() {
            tracing::debug!("Skipping {}: {}", url, describe(&result));
        }
        result
            .into_page()
            .and_then(|page| extract_email(&page, &self.filter))
    }

    fn secondary_timeout(&self) -> Duration {
        self.crawl.secondary_timeout()
    }
}

fn found(candidate: EmailCandidate) -> EmailOutcome {
    tracing::info!("Found {} ({:?})", candidate.address, candidate.provenance);
    EmailOutcome::Found(candidate.address)
}

fn describe(result: &PageFetchResult) -> String {
    match result {
        PageFetchResult::Success(_) => "loaded".to_string(),
        PageFetchResult::Timeout => "timeout".to_string(),
        PageFetchResult::NavigationError(message) => message.clone(),
    }
}
