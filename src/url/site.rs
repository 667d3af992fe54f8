use crate::UrlError;
use url::{Host, Url};

/// Returns true if any label of the host is `www`
pub fn has_www_label(url: &Url) -> bool {
    url.host_str()
        .map(|host| host.split('.').any(|label| label.eq_ignore_ascii_case("www")))
        .unwrap_or(false)
}

/// Builds the `www.`-prefixed variant of a site URL
///
/// The variant keeps scheme, port and path and drops query and fragment.
/// IP hosts and hosts that already carry a `www` label have no variant.
///
/// # Examples
///
/// ```
/// use contact_harvest::url::www_variant;
/// use url::Url;
///
/// let url = Url::parse("http://acme.com/shop?x=1").unwrap();
/// assert_eq!(www_variant(&url).unwrap().as_str(), "http://www.acme.com/shop");
///
/// let url = Url::parse("http://www.acme.com/").unwrap();
/// assert!(www_variant(&url).is_none());
/// ```
pub fn www_variant(url: &Url) -> Option<Url> {
    if has_www_label(url) {
        return None;
    }

    let domain = match url.host()? {
        Host::Domain(domain) => domain.to_string(),
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };

    let mut variant = url.clone();
    variant.set_host(Some(&format!("www.{}", domain))).ok()?;
    variant.set_query(None);
    variant.set_fragment(None);
    Some(variant)
}

/// Returns `scheme://host[:port]` for a site URL
pub fn site_origin(url: &Url) -> Result<String, UrlError> {
    let host = url
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Appends an absolute path to the site's scheme and host
///
/// # Examples
///
/// ```
/// use contact_harvest::url::contact_url;
/// use url::Url;
///
/// let site = Url::parse("https://acme.com/deep/page?q=1").unwrap();
/// let url = contact_url(&site, "/contact-us").unwrap();
/// assert_eq!(url.as_str(), "https://acme.com/contact-us");
/// ```
pub fn contact_url(site: &Url, path: &str) -> Result<Url, UrlError> {
    let origin = site_origin(site)?;
    let joined = format!("{}{}", origin, path);
    Url::parse(&joined).map_err(|e| UrlError::Parse(format!("{} ({})", joined, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_has_www_label() {
        assert!(has_www_label(&url("http://www.acme.com/")));
        assert!(has_www_label(&url("http://shop.www.acme.com/")));
        assert!(!has_www_label(&url("http://acme.com/")));
        assert!(!has_www_label(&url("http://wwwacme.com/")));
    }

    #[test]
    fn test_www_variant_keeps_path_and_port() {
        let variant = www_variant(&url("http://acme.com:8080/about#team")).unwrap();
        assert_eq!(variant.as_str(), "http://www.acme.com:8080/about");
    }

    #[test]
    fn test_no_www_variant_for_ip_hosts() {
        assert!(www_variant(&url("http://127.0.0.1:3000/")).is_none());
        assert!(www_variant(&url("http://[::1]/")).is_none());
    }

    #[test]
    fn test_site_origin() {
        assert_eq!(
            site_origin(&url("https://acme.com/a/b?c=d")).unwrap(),
            "https://acme.com"
        );
        assert_eq!(
            site_origin(&url("http://127.0.0.1:4000/x")).unwrap(),
            "http://127.0.0.1:4000"
        );
    }

    #[test]
    fn test_contact_url_nested_path() {
        let joined = contact_url(&url("http://www.acme.com/home"), "/about-us/contact").unwrap();
        assert_eq!(joined.as_str(), "http://www.acme.com/about-us/contact");
    }
}
