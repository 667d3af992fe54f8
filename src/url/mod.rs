//! URL handling module for Contact-Harvest
//!
//! This module turns raw `Website` cells into fetchable URLs and derives the
//! secondary URLs a site search needs: the `www.` fallback and contact page
//! candidates.

mod normalize;
mod site;

pub use normalize::normalize_website;
pub use site::{contact_url, has_www_label, site_origin, www_variant};
