use crate::UrlError;
use url::Url;

/// Normalizes a raw `Website` cell into a fetchable URL
///
/// # Normalization Steps
///
/// 1. Reject a missing value or one that is blank after trimming
/// 2. Trim surrounding whitespace
/// 3. Prefix `http://` when the value carries no `http://` or `https://`
///    scheme (a protocol-relative `//host` gets `http:`)
/// 4. Parse; reject if malformed or if the result has no host
///
/// The scheme is prefixed at most once, so normalizing an already
/// normalized URL is a no-op apart from `url`'s own canonical form.
///
/// # Arguments
///
/// * `raw` - The website value from the record, if any
///
/// # Returns
///
/// * `Ok(Url)` - URL with a scheme and a non-empty host
/// * `Err(UrlError::Empty)` - No usable value
/// * `Err(UrlError)` - Value could not be turned into a URL
///
/// # Examples
///
/// ```
/// use contact_harvest::url::normalize_website;
///
/// let url = normalize_website(Some("  example.org ")).unwrap();
/// assert_eq!(url.as_str(), "http://example.org/");
///
/// assert!(normalize_website(Some("   ")).is_err());
/// assert!(normalize_website(None).is_err());
/// ```
pub fn normalize_website(raw: Option<&str>) -> Result<Url, UrlError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = with_scheme(trimmed);

    let url = Url::parse(&candidate)
        .map_err(|e| UrlError::Parse(format!("{} ({})", candidate, e)))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(candidate)),
    }
}

/// Returns the value with an HTTP(S) scheme, prefixing `http://` if needed
fn with_scheme(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        value.to_string()
    } else if let Some(rest) = value.strip_prefix("//") {
        format!("http://{}", rest)
    } else {
        format!("http://{}", value)
    }
}
