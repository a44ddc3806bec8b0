//! Junk-URL filtering.
//!
//! Two gates keep noise out of the visited store:
//! 1. per-link validity: URLs matching ad/tracker/analytics markers are
//!    never recorded;
//! 2. per-page exclusion: hosts on the excluded list never run the tracker
//!    at all (applied by the session to the hosting page, not to links).

use regex::{Regex, RegexBuilder};
use tracing::debug;
use url::Url;

/// Markers that flag a URL as non-trackable junk. Matched case-insensitively
/// against the full raw URL.
const INVALID_URL_PATTERNS: &[&str] = &[
    r"ads?[-_.]",
    r"banners?[-_.]",
    r"pop[-_.]?ups?",
    r"track[-_.]?",
    r"metrics[-_.]?",
    r"affiliate[-_.]?",
    r"analytics[-_.]?",
    r"\.(doubleclick\.net|googleads\.g\.doubleclick\.net|googlesyndication\.com)",
];

/// Base host names on which the tracker stays idle. Any subdomain of a
/// listed name matches, the TLD does not matter.
pub const DEFAULT_EXCLUDED_HOSTS: &[&str] = &[
    "sonar-cdn",
    "google",
    "facebook",
    "youtube",
    "fbsbx",
    "googletagmanager",
    "qccoccocmedia",
    "chatgpt",
    "github",
    "ssp.api.tappx",
    "js.adscale",
    "dsp-service.admatic",
    "eus.rubiconproject",
    "sync.adprime",
    "rtb.gumgum",
];

pub struct ValidityFilter {
    patterns: Vec<Regex>,
    excluded_hosts: Vec<String>,
}

impl ValidityFilter {
    pub fn new(excluded_hosts: &[String]) -> Self {
        let patterns = INVALID_URL_PATTERNS
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        debug!("skipping unparseable validity pattern {}: {}", pattern, e);
                        None
                    }
                }
            })
            .collect();

        Self {
            patterns,
            excluded_hosts: excluded_hosts.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    /// Pure predicate: `false` means the URL must never enter the store.
    pub fn is_valid(&self, url: &str) -> bool {
        !self.patterns.iter().any(|re| re.is_match(url))
    }

    /// Whether the hosting page's URL is on the excluded-host list.
    pub fn is_excluded_host(&self, page_url: &str) -> bool {
        let Ok(parsed) = Url::parse(page_url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        // Strip the final label, then require the excluded name to sit at a
        // label boundary: "gist.github.com" -> stem "gist.github".
        let Some((stem, _tld)) = host.rsplit_once('.') else {
            return false;
        };
        self.excluded_hosts
            .iter()
            .any(|name| stem == name.as_str() || stem.ends_with(&format!(".{}", name)))
    }
}

impl Default for ValidityFilter {
    fn default() -> Self {
        let hosts: Vec<String> = DEFAULT_EXCLUDED_HOSTS.iter().map(|h| h.to_string()).collect();
        Self::new(&hosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_and_ad_urls_are_invalid() {
        let filter = ValidityFilter::default();
        assert!(!filter.is_valid("https://ads.example.com/track?id=1"));
        assert!(!filter.is_valid("https://example.com/banner-top.png"));
        assert!(!filter.is_valid("https://example.com/popup_main"));
        assert!(!filter.is_valid("https://metrics.example.com/beacon"));
        assert!(!filter.is_valid("https://example.com/affiliate.link"));
        assert!(!filter.is_valid("https://stats.g.doubleclick.net/r/collect"));
    }

    #[test]
    fn test_validity_is_case_insensitive() {
        let filter = ValidityFilter::default();
        assert!(!filter.is_valid("https://example.com/ADS_square"));
        assert!(!filter.is_valid("https://example.com/Analytics.js"));
    }

    #[test]
    fn test_ordinary_urls_are_valid() {
        let filter = ValidityFilter::default();
        assert!(filter.is_valid("https://example.com/articles/42"));
        assert!(filter.is_valid("https://blog.example.com/post?page=2"));
        // "loads" contains "ads" but not at a separator boundary
        assert!(filter.is_valid("https://example.com/downloads"));
    }

    #[test]
    fn test_excluded_hosts_match_any_subdomain() {
        let filter = ValidityFilter::default();
        assert!(filter.is_excluded_host("https://github.com/user/repo"));
        assert!(filter.is_excluded_host("https://gist.github.com/user"));
        assert!(filter.is_excluded_host("https://www.youtube.com/watch?v=x"));
        assert!(filter.is_excluded_host("https://google.de/search"));
        assert!(!filter.is_excluded_host("https://example.com/github"));
        assert!(!filter.is_excluded_host("https://notgithub.com/"));
    }

    #[test]
    fn test_excluded_host_gate_ignores_malformed_urls() {
        let filter = ValidityFilter::default();
        assert!(!filter.is_excluded_host("not a url"));
        assert!(!filter.is_excluded_host(""));
    }

    #[test]
    fn test_custom_excluded_hosts() {
        let filter = ValidityFilter::new(&["intranet".to_string()]);
        assert!(filter.is_excluded_host("https://wiki.intranet.example/"));
        assert!(!filter.is_excluded_host("https://github.com/user/repo"));
    }
}
