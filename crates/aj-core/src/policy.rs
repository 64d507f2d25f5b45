//! Redirect Policy
//!
//! Combines the loop guard, registry membership, page classification and
//! redirect mode into a single [`Action`]. Holds no state: the same inputs
//! always produce the same action.

use crate::classifier::classify;
use crate::settings::Settings;
use crate::sites::{is_archive_host, SiteRegistry};
use crate::types::{Action, BadgeKind, PageClassification, RedirectMode};
use crate::url::hostname;

/// Newest-snapshot endpoint of the archive service.
pub const ARCHIVE_NEWEST_PREFIX: &str = "https://archive.ph/newest/";

/// Archive search/submit page.
pub const ARCHIVE_SEARCH_PREFIX: &str = "https://archive.ph/";

/// Redirect target for the newest archived copy of `url`.
#[inline]
pub fn archive_url_for(url: &str) -> String {
    format!("{}{}", ARCHIVE_NEWEST_PREFIX, url)
}

/// Archive search page for `url`, used when no snapshot is wanted.
#[inline]
pub fn fallback_archive_url_for(url: &str) -> String {
    format!("{}{}", ARCHIVE_SEARCH_PREFIX, url)
}

// =============================================================================
// Policy
// =============================================================================

/// Redirect policy over a site registry.
#[derive(Debug, Clone, Copy)]
pub struct RedirectPolicy<'a> {
    registry: &'a SiteRegistry,
}

impl<'a> RedirectPolicy<'a> {
    pub fn new(registry: &'a SiteRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a SiteRegistry {
        self.registry
    }

    /// Decide what to do with a navigation to `url` on `hostname`.
    pub fn decide(&self, hostname: &str, url: &str, mode: RedirectMode, is_archive_host: bool) -> Action {
        // Loop guard comes before everything else
        if is_archive_host {
            return Action::NoOp;
        }

        if !self.registry.contains_host(hostname) {
            return Action::NoOp;
        }

        let classification = classify(url).classification;

        match (mode, classification) {
            (RedirectMode::Automatic, PageClassification::Article) => Action::ImmediateRedirect {
                target_url: archive_url_for(url),
            },
            (RedirectMode::Automatic, PageClassification::NonArticle) => Action::ShowBadge {
                kind: BadgeKind::Home,
                store_url: url.to_string(),
            },
            (RedirectMode::Manual, classification) => Action::ShowBadge {
                kind: BadgeKind::for_classification(classification),
                store_url: url.to_string(),
            },
        }
    }

    /// Full pipeline for one navigation: enabled gate, host extraction,
    /// loop guard, then [`RedirectPolicy::decide`].
    pub fn evaluate(&self, url: &str, settings: &Settings) -> Action {
        if !settings.enabled {
            return Action::NoOp;
        }

        let host = match hostname(url) {
            Some(host) => host,
            None => return Action::NoOp,
        };

        let action = self.decide(&host, url, settings.redirect_mode, is_archive_host(&host));
        if !action.is_noop() {
            log::debug!("{} [{}] -> {}", url, settings.redirect_mode, action.name());
        }
        action
    }
}

impl Default for RedirectPolicy<'static> {
    fn default() -> Self {
        Self::new(SiteRegistry::builtin())
    }
}

/// [`RedirectPolicy::decide`] over the built-in registry.
pub fn decide(hostname: &str, url: &str, mode: RedirectMode, is_archive_host: bool) -> Action {
    RedirectPolicy::default().decide(hostname, url, mode, is_archive_host)
}

/// [`RedirectPolicy::evaluate`] over the built-in registry.
pub fn evaluate(url: &str, settings: &Settings) -> Action {
    RedirectPolicy::default().evaluate(url, settings)
}

/// Whether the in-page "view on archive" button should be offered.
#[inline]
pub fn offers_archive_button(action: &Action) -> bool {
    matches!(action, Action::ShowBadge { .. })
}
