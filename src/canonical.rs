//! URL canonicalization.
//!
//! Reduces a raw URL to a stable key identifying "the same content":
//! hostname labels folded per policy, path and query kept, fragment dropped.
//! Two URLs that differ only in fragment, or only in subdomains folded
//! together by the active policy, share a key.

use serde::{Deserialize, Serialize};
use url::Url;

/// How hostname labels are folded into the domain token of a key.
///
/// The two policies produce incompatible key formats. Data recorded under
/// one policy must not be mixed with data recorded under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DomainFoldPolicy {
    /// Join every hostname label except the last:
    /// `news.ex.ample.com` -> `news.ex.ample`.
    #[default]
    AllButTld,
    /// Exactly the third-from-last label when more than two labels exist,
    /// else the first label: `news.ex.ample.com` -> `ex`.
    ThirdFromLast,
}

impl DomainFoldPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            DomainFoldPolicy::AllButTld => "all-but-tld",
            DomainFoldPolicy::ThirdFromLast => "third-from-last",
        }
    }

    fn fold(&self, hostname: &str) -> String {
        let labels: Vec<&str> = hostname.split('.').collect();
        match self {
            DomainFoldPolicy::AllButTld => labels[..labels.len().saturating_sub(1)].join("."),
            DomainFoldPolicy::ThirdFromLast => {
                if labels.len() > 2 {
                    labels[labels.len() - 3].to_string()
                } else {
                    labels[0].to_string()
                }
            }
        }
    }
}

/// Canonicalize a raw URL to its key, or `None` when it does not parse as
/// an absolute URL with a host. Callers skip `None` silently.
pub fn canonicalize(raw: &str, policy: DomainFoldPolicy) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    let domain_token = policy.fold(host);
    match parsed.query() {
        Some(query) => Some(format!("{}{}?{}", domain_token, parsed.path(), query)),
        None => Some(format!("{}{}", domain_token, parsed.path())),
    }
}
