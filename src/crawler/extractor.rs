//! Email extraction from loaded pages
//!
//! Every function here is a pure function of page content: no I/O, no
//! panics on malformed markup, and the same input always yields the same
//! candidate. Candidates are returned in document order and the first one
//! wins.

use crate::config::ExtractionConfig;
use crate::session::LoadedPage;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Loose address pattern applied to raw page content
pub static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("email pattern is valid"));

const MAILTO_SCHEME: &str = "mailto:";
const CONTACT_KEYWORD: &str = "contact";

/// Where a candidate address was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// `href="mailto:..."` on the page being inspected
    MailtoLink,
    /// Pattern match in the raw content of the page being inspected
    PageText,
    /// Found on one of the guessed contact paths
    ContactPage,
    /// Found by following a contact-like link from the main page
    DiscoveredLink,
}

/// An address found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCandidate {
    pub address: String,
    pub provenance: Provenance,
}

impl EmailCandidate {
    pub fn new(address: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            address: address.into(),
            provenance,
        }
    }

    /// Re-labels a candidate found on a secondary page
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

/// Returns true if the whole value is an email address
///
/// # Example
///
/// ```
/// use contact_harvest::crawler::looks_like_email;
///
/// assert!(looks_like_email("sales@widgets.com"));
/// assert!(!looks_like_email("Send Email"));
/// ```
pub fn looks_like_email(value: &str) -> bool {
    EMAIL_REGEX
        .find(value)
        .map(|m| m.start() == 0 && m.end() == value.len())
        .unwrap_or(false)
}

/// Drops template and placeholder addresses found in page text
#[derive(Debug, Clone)]
pub struct PlaceholderFilter {
    domains: Vec<String>,
    local_parts: Vec<String>,
}

impl PlaceholderFilter {
    pub fn new<D, L>(domains: D, local_parts: L) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            domains: domains.into_iter().map(|d| d.as_ref().to_lowercase()).collect(),
            local_parts: local_parts
                .into_iter()
                .map(|l| l.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(&config.placeholder_domains, &config.placeholder_local_parts)
    }

    /// Returns true if the address should be ignored
    ///
    /// An address is a placeholder when its domain contains a placeholder
    /// domain token or its local part is a placeholder word.
    pub fn is_placeholder(&self, address: &str) -> bool {
        let Some((local, domain)) = address.rsplit_once('@') else {
            return false;
        };
        let local = local.to_lowercase();
        let domain = domain.to_lowercase();

        self.domains.iter().any(|d| domain.contains(d.as_str()))
            || self.local_parts.iter().any(|l| *l == local)
    }
}

impl Default for PlaceholderFilter {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Finds the first mailto link on a page
///
/// Anchors are scanned in document order. A link counts only if the text
/// right after `mailto:` is an address.
pub fn extract_mailto(page: &LoadedPage) -> Option<EmailCandidate> {
    let document = page.document();
    first_mailto(&document)
}

fn first_mailto(document: &Html) -> Option<EmailCandidate> {
    let selector = Selector::parse("a[href]").ok()?;

    document.select(&selector).find_map(|element| {
        let href = element.value().attr("href")?.trim();
        let rest = strip_prefix_ignore_case(href, MAILTO_SCHEME)?;
        let m = EMAIL_REGEX.find(rest)?;
        if m.start() != 0 {
            return None;
        }
        Some(EmailCandidate::new(
            trim_trailing_punctuation(m.as_str()),
            Provenance::MailtoLink,
        ))
    })
}

/// Finds the first non-placeholder address in raw page content
///
/// The pattern runs over the markup as served, so addresses inside
/// attributes and scripts are found too.
pub fn extract_from_text(content: &str, filter: &PlaceholderFilter) -> Option<EmailCandidate> {
    EMAIL_REGEX
        .find_iter(content)
        .map(|m| trim_trailing_punctuation(m.as_str()))
        .find(|address| looks_like_email(address) && !filter.is_placeholder(address))
        .map(|address| EmailCandidate::new(address, Provenance::PageText))
}

/// Runs the mailto check and then the text check on one page
pub fn extract_email(page: &LoadedPage, filter: &PlaceholderFilter) -> Option<EmailCandidate> {
    extract_mailto(page).or_else(|| extract_from_text(&page.content, filter))
}

/// Picks contact-like links from a page
///
/// Selects the first `limit` anchors whose visible text or `href` mentions
/// "contact", then resolves them against the page's final URL. Selected
/// anchors without an http(s) target are skipped, not replaced.
///
/// # Arguments
///
/// * `page` - The page to inspect
/// * `limit` - Maximum number of anchors to select
///
/// # Returns
///
/// Absolute URLs in document order
pub fn find_contact_links(page: &LoadedPage, limit: usize) -> Vec<Url> {
    let document = page.document();
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| {
            let href = element.value().attr("href").unwrap_or("");
            let text: String = element.text().collect();
            contains_keyword(href) || contains_keyword(&text)
        })
        .take(limit)
        .filter_map(|element| resolve_link(element.value().attr("href")?, &page.final_url))
        .collect()
}

fn contains_keyword(value: &str) -> bool {
    value.to_lowercase().contains(CONTACT_KEYWORD)
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for javascript:, mailto:, tel: and data: links, fragment-only
/// links, and anything that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

// Sentence punctuation after an address is swallowed by the domain class
fn trim_trailing_punctuation(address: &str) -> &str {
    address.trim_end_matches(|c| c == '.' || c == '-')
}
