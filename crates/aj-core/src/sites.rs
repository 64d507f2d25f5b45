//! Paywalled site registry
//!
//! Membership is decided by walking the host's suffixes on label
//! boundaries, so `www.nytimes.com` matches `nytimes.com` while
//! `evilnytimes.com` and `nytimes.com.evil.com` do not.
//!
//! # Examples
//!
//! ```
//! use aj_core::sites::is_paywalled_site;
//!
//! assert!(is_paywalled_site("www.nytimes.com"));
//! assert!(!is_paywalled_site("evilnytimes.com"));
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;

// =============================================================================
// Built-in Site List
// =============================================================================

/// Root domains of known paywalled publications.
pub const PAYWALLED_SITES: &[&str] = &[
    // Major newspapers
    "nytimes.com",
    "wsj.com",
    "washingtonpost.com",
    "ft.com",
    "economist.com",
    "newyorker.com",
    "theatlantic.com",
    "harpers.org",
    "bloomberg.com",
    "reuters.com",
    "latimes.com",
    "chicagotribune.com",
    "bostonglobe.com",
    "seattletimes.com",
    "sfgate.com",
    "usatoday.com",
    // Tech publications
    "wired.com",
    "techcrunch.com",
    "theverge.com",
    "arstechnica.com",
    "engadget.com",
    "recode.net",
    "venturebeat.com",
    "zdnet.com",
    "cnet.com",
    // Business publications
    "fortune.com",
    "businessinsider.com",
    "forbes.com",
    "marketwatch.com",
    "cnbc.com",
    "fastcompany.com",
    "inc.com",
    "entrepreneur.com",
    // International
    "theguardian.com",
    "bbc.com",
    "telegraph.co.uk",
    "independent.co.uk",
    "lemonde.fr",
    "spiegel.de",
    "elpais.com",
    "corriere.it",
    "nrc.nl",
    // Science and culture
    "scientificamerican.com",
    "nationalgeographic.com",
    "smithsonianmag.com",
    "newscientist.com",
    "nature.com",
    "science.org",
];

/// Hosts of the archive service itself. Never redirected.
pub const ARCHIVE_HOST_MARKERS: &[&str] = &["archive.ph", "archive.today"];

static BUILTIN: Lazy<SiteRegistry> = Lazy::new(SiteRegistry::builtin_list);

// =============================================================================
// Registry
// =============================================================================

/// Immutable set of paywalled root domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRegistry {
    roots: HashSet<String>,
}

impl SiteRegistry {
    /// Registry over the given root domains.
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots = roots
            .into_iter()
            .map(|root| root.as_ref().trim().to_ascii_lowercase())
            .filter(|root| !root.is_empty())
            .collect();
        Self { roots }
    }

    fn builtin_list() -> Self {
        Self::new(PAYWALLED_SITES)
    }

    /// Shared registry of the built-in site list.
    pub fn builtin() -> &'static SiteRegistry {
        &BUILTIN
    }

    /// Parse a site list: one domain per line, `#` starts a comment.
    /// Lines that do not look like a domain are skipped with a warning.
    pub fn from_list_text(text: &str) -> Self {
        let mut roots = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            let line = line.trim().trim_start_matches("*.");
            if line.is_empty() {
                continue;
            }
            if !is_domain_like(line) {
                log::warn!("site list line {}: ignoring '{}'", idx + 1, line);
                continue;
            }
            roots.push(line);
        }

        Self::new(roots)
    }

    /// True if `hostname` is a registered root or one of its subdomains.
    pub fn contains_host(&self, hostname: &str) -> bool {
        if hostname.is_empty() {
            return false;
        }
        walk_host_suffixes(hostname).any(|suffix| self.roots.contains(suffix))
    }

    /// Registered root domains, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.roots.iter().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Check a hostname against the built-in registry.
#[inline]
pub fn is_paywalled_site(hostname: &str) -> bool {
    SiteRegistry::builtin().contains_host(hostname)
}

/// Loop guard: true for any host of the archive service.
#[inline]
pub fn is_archive_host(hostname: &str) -> bool {
    ARCHIVE_HOST_MARKERS.iter().any(|marker| hostname.contains(marker))
}

fn is_domain_like(s: &str) -> bool {
    s.contains('.')
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

// =============================================================================
// Suffix Walking
// =============================================================================

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Iterator over a host and each of its parent domains.
pub struct HostSuffixIter<'a> {
    current: Option<&'a str>,
}

impl<'a> Iterator for HostSuffixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        self.current = get_parent_domain(result);
        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
pub fn walk_host_suffixes(host: &str) -> HostSuffixIter<'_> {
    HostSuffixIter {
        current: if host.is_empty() { None } else { Some(host) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_subdomains_match() {
        assert!(is_paywalled_site("nytimes.com"));
        assert!(is_paywalled_site("www.nytimes.com"));
        assert!(is_paywalled_site("cooking.nytimes.com"));
        assert!(is_paywalled_site("www.telegraph.co.uk"));
    }

    #[test]
    fn test_suffix_only_on_label_boundary() {
        assert!(!is_paywalled_site("evilnytimes.com"));
        assert!(!is_paywalled_site("nytimes.com.evil.com"));
        assert!(!is_paywalled_site("co.uk"));
        assert!(!is_paywalled_site("com"));
    }

    #[test]
    fn test_empty_and_malformed_hosts() {
        assert!(!is_paywalled_site(""));
        assert!(!is_paywalled_site("."));
        assert!(!is_paywalled_site("nytimes.com."));
        assert!(!is_paywalled_site("not a host"));
    }

    #[test]
    fn test_archive_host_markers() {
        assert!(is_archive_host("archive.ph"));
        assert!(is_archive_host("www.archive.ph"));
        assert!(is_archive_host("archive.today"));
        assert!(!is_archive_host("nytimes.com"));
    }

    #[test]
    fn test_builtin_list_is_complete() {
        assert_eq!(SiteRegistry::builtin().len(), PAYWALLED_SITES.len());
        assert_eq!(SiteRegistry::default(), *SiteRegistry::builtin());
    }

    #[test]
    fn test_from_list_text() {
        let registry = SiteRegistry::from_list_text(
            "# local papers\nStarTribune.com\n*.post-gazette.com  # wildcard prefix\n\nnot a domain\n",
        );
        assert_eq!(registry.domains(), vec!["post-gazette.com", "startribune.com"]);
        assert!(registry.contains_host("www.startribune.com"));
        assert!(!registry.contains_host("nytimes.com"));
    }

    #[test]
    fn test_walk_host_suffixes() {
        let suffixes: Vec<&str> = walk_host_suffixes("a.b.example.com").collect();
        assert_eq!(suffixes, vec!["a.b.example.com", "b.example.com", "example.com", "com"]);
        assert_eq!(walk_host_suffixes("").count(), 0);
    }

    #[test]
    fn test_get_parent_domain() {
        assert_eq!(get_parent_domain("sub.example.com"), Some("example.com"));
        assert_eq!(get_parent_domain("example.com"), Some("com"));
        assert_eq!(get_parent_domain("com"), None);
        assert_eq!(get_parent_domain(""), None);
    }
}
