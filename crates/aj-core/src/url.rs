//! URL splitting for navigation targets
//!
//! Parsing follows the WHATWG URL standard through the `url` crate, so
//! hosts and paths match what the browser reports for the same navigation:
//! dot segments are resolved, non-ASCII path bytes are percent-encoded and
//! special schemes accept the slash-less `https:host/path` form.

use ::url::Url;

/// Lowercased host and path of an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationUrl {
    pub host: String,
    pub path: String,
}

impl NavigationUrl {
    /// Split an absolute URL. Returns None when the URL cannot be parsed or
    /// has no host.
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str().filter(|host| !host.is_empty())?;
        Some(Self {
            host: host.to_ascii_lowercase(),
            path: parsed.path().to_lowercase(),
        })
    }
}

/// Non-empty `/`-separated segments of a path.
#[inline]
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Lowercased hostname of a URL, None when unparsable.
pub fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_ascii_lowercase())
}
