//! Hostname extraction and URL checks
//!
//! Browsers hand out IDN hostnames in punycode (`xn--pple-43d.com`), so the
//! host is converted back to Unicode before it reaches the detector.

use crate::detector::{scan, DetectionResult};
use crate::error::GuardError;
use tracing::debug;
use url::{Host, Url};

/// Outcome of checking a tab or page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    /// Internal or extension page, never scanned
    Exempt,
    /// URL could not be parsed or has no host
    Unparsable(GuardError),
    /// Hostname was scanned
    Scanned {
        hostname: String,
        detection: DetectionResult,
    },
}

impl UrlCheck {
    pub fn has_cyrillic(&self) -> bool {
        match self {
            UrlCheck::Scanned { detection, .. } => detection.has_match,
            UrlCheck::Exempt | UrlCheck::Unparsable(_) => false,
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        match self {
            UrlCheck::Scanned { hostname, .. } => Some(hostname),
            _ => None,
        }
    }
}

/// True if the URL starts with one of the exempt prefixes
pub fn is_exempt<S: AsRef<str>>(url: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| url.starts_with(p.as_ref()))
}

/// Extract the hostname of a URL in Unicode form
pub fn hostname(raw: &str) -> Result<String, GuardError> {
    let parsed = Url::parse(raw).map_err(|e| GuardError::MalformedUrl(format!("{}: {}", raw, e)))?;

    match parsed.host() {
        Some(Host::Domain(domain)) => Ok(unicode_host(domain)),
        Some(other) => Ok(other.to_string()),
        None => Err(GuardError::MissingHost(raw.to_string())),
    }
}

/// Decode punycode labels, keeping the input if decoding fails
pub fn unicode_host(host: &str) -> String {
    let (unicode, result) = idna::domain_to_unicode(host);
    match result {
        Ok(()) => unicode,
        Err(_) => host.to_string(),
    }
}

/// Check a URL the way the coordinator does on tab events
pub fn check_url<S: AsRef<str>>(url: &str, exempt_prefixes: &[S]) -> UrlCheck {
    if is_exempt(url, exempt_prefixes) {
        debug!(url, "Skipping internal URL");
        return UrlCheck::Exempt;
    }

    match hostname(url) {
        Ok(hostname) => {
            let detection = scan(&hostname);
            UrlCheck::Scanned {
                hostname,
                detection,
            }
        }
        Err(e) => {
            debug!(error = %e, "Treating unparsable URL as clean");
            UrlCheck::Unparsable(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use pretty_assertions::assert_eq;

    fn prefixes() -> Vec<String> {
        GuardConfig::default().exempt_prefixes
    }

    #[test]
    fn test_punycode_host_is_decoded() {
        assert_eq!(hostname("https://xn--pple-43d.com/login").unwrap(), "аpple.com");
    }

    #[test]
    fn test_unicode_host_survives_parsing() {
        assert_eq!(hostname("https://аpple.com").unwrap(), "аpple.com");
    }

    #[test]
    fn test_port_and_userinfo_are_dropped() {
        assert_eq!(
            hostname("https://user:pw@example.com:8443/path?q=1#frag").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_ip_hosts() {
        assert_eq!(hostname("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
        assert_eq!(hostname("http://[::1]/").unwrap(), "[::1]");
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(hostname("not a url"), Err(GuardError::MalformedUrl(_))));
    }

    #[test]
    fn test_url_without_host() {
        assert!(matches!(
            hostname("data:text/plain,hello"),
            Err(GuardError::MissingHost(_))
        ));
    }

    #[test]
    fn test_exempt_schemes() {
        let prefixes = prefixes();
        assert!(is_exempt("chrome://settings", &prefixes));
        assert!(is_exempt("chrome-extension://abcdef/popup.html", &prefixes));
        assert!(is_exempt("edge://flags", &prefixes));
        assert!(is_exempt("moz-extension://uuid/page.html", &prefixes));
        assert!(is_exempt("about:blank", &prefixes));
        assert!(!is_exempt("https://example.com", &prefixes));
    }

    #[test]
    fn test_exempt_url_is_never_scanned() {
        // Would match if it were scanned
        let check = check_url("chrome://настройки", &prefixes());
        assert_eq!(check, UrlCheck::Exempt);
        assert!(!check.has_cyrillic());
    }

    #[test]
    fn test_cyrillic_hostname_flagged() {
        let check = check_url("https://аpple.com", &prefixes());
        assert!(check.has_cyrillic());
        assert_eq!(check.hostname(), Some("аpple.com"));
    }

    #[test]
    fn test_cyrillic_path_not_flagged() {
        let check = check_url("https://example.com/привет", &prefixes());
        assert!(!check.has_cyrillic());
    }

    #[test]
    fn test_unparsable_url_is_clean() {
        let check = check_url("::::", &prefixes());
        assert!(matches!(check, UrlCheck::Unparsable(_)));
        assert!(!check.has_cyrillic());
    }
}
