//! Tab State Coordinator
//!
//! Owns the per-tab pending-URL slot and turns browser events into
//! [`Effect`] lists. Each tab is either clean or has one pending
//! paywalled URL with a badge; a newer navigation overwrites the slot.
//!
//! The coordinator never touches the browser. Effects are executed by an
//! [`EffectSink`] through [`apply_effects`], which keeps going past
//! failures and hands them back to the caller.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CollaboratorError;
use crate::policy::{archive_url_for, RedirectPolicy};
use crate::settings::Settings;
use crate::sites::SiteRegistry;
use crate::types::{Action, Badge, BadgeKind, TabId, MAIN_FRAME_ID};
use crate::url::hostname;

// =============================================================================
// State and Effects
// =============================================================================

/// Observable state of one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TabState {
    Clean,
    PendingBadge { url: String, kind: BadgeKind },
}

/// Side effect requested from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    #[serde(rename_all = "camelCase")]
    Navigate { tab_id: TabId, url: String },
    #[serde(rename_all = "camelCase")]
    SetBadge { tab_id: TabId, badge: Badge },
    #[serde(rename_all = "camelCase")]
    ClearBadge { tab_id: TabId },
}

impl Effect {
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::Navigate { tab_id, .. } | Self::SetBadge { tab_id, .. } | Self::ClearBadge { tab_id } => *tab_id,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEntry {
    url: String,
    kind: BadgeKind,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Per-tab state machine.
#[derive(Debug, Clone, Default)]
pub struct TabCoordinator {
    registry: SiteRegistry,
    pending: HashMap<TabId, PendingEntry>,
}

impl TabCoordinator {
    /// Coordinator over the built-in site registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SiteRegistry) -> Self {
        Self {
            registry,
            pending: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Swap the registry. Pending state is kept.
    pub fn set_registry(&mut self, registry: SiteRegistry) {
        self.registry = registry;
    }

    pub fn policy(&self) -> RedirectPolicy<'_> {
        RedirectPolicy::new(&self.registry)
    }

    // -------------------------------------------------------------------------
    // Keyed store
    // -------------------------------------------------------------------------

    pub fn tab_state(&self, tab_id: TabId) -> TabState {
        match self.pending.get(&tab_id) {
            Some(entry) => TabState::PendingBadge {
                url: entry.url.clone(),
                kind: entry.kind,
            },
            None => TabState::Clean,
        }
    }

    pub fn pending_url(&self, tab_id: TabId) -> Option<&str> {
        self.pending.get(&tab_id).map(|entry| entry.url.as_str())
    }

    /// Store the pending URL for a tab, replacing any previous one.
    pub fn set_pending(&mut self, tab_id: TabId, url: String, kind: BadgeKind) {
        self.pending.insert(tab_id, PendingEntry { url, kind });
    }

    pub fn clear_pending(&mut self, tab_id: TabId) -> Option<String> {
        self.pending.remove(&tab_id).map(|entry| entry.url)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// A navigation is about to start.
    pub fn on_before_navigate(&mut self, tab_id: TabId, frame_id: i32, url: &str, settings: &Settings) -> Vec<Effect> {
        if frame_id != MAIN_FRAME_ID {
            return Vec::new();
        }

        let action = self.policy().evaluate(url, settings);
        match action {
            Action::ImmediateRedirect { target_url } => {
                self.clear_pending(tab_id);
                vec![Effect::Navigate { tab_id, url: target_url }]
            }
            Action::ShowBadge { kind, store_url } => self.show_badge(tab_id, store_url, kind),
            Action::ClearBadge => {
                self.clear_pending(tab_id);
                vec![Effect::ClearBadge { tab_id }]
            }
            Action::NoOp => Vec::new(),
        }
    }

    /// A navigation finished loading. Re-runs the decision and brings the
    /// badge in line with it.
    pub fn on_navigation_complete(&mut self, tab_id: TabId, url: &str, settings: &Settings) -> Vec<Effect> {
        let action = self.policy().evaluate(url, settings);
        match action {
            Action::ShowBadge { kind, store_url } => self.show_badge(tab_id, store_url, kind),
            // Redirects are issued when the navigation starts
            Action::ImmediateRedirect { .. } => Vec::new(),
            Action::ClearBadge | Action::NoOp => {
                self.clear_pending(tab_id);
                vec![Effect::ClearBadge { tab_id }]
            }
        }
    }

    /// The tab was closed.
    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        if self.clear_pending(tab_id).is_some() {
            log::debug!("tab {} closed, pending URL dropped", tab_id);
        }
    }

    /// The toolbar icon was clicked. Redirects the pending URL, or the
    /// tab's current URL when nothing is pending, if it is paywalled.
    pub fn on_action_clicked(&mut self, tab_id: TabId, current_url: Option<&str>) -> Vec<Effect> {
        let target = match (self.pending_url(tab_id), current_url) {
            (Some(pending), _) => pending.to_string(),
            (None, Some(current)) => current.to_string(),
            (None, None) => return Vec::new(),
        };

        let paywalled = hostname(&target)
            .map(|host| self.registry.contains_host(&host))
            .unwrap_or(false);
        if !paywalled {
            log::debug!("icon click on tab {}: {} is not paywalled", tab_id, target);
            return Vec::new();
        }

        self.clear_pending(tab_id);
        log::debug!("manual redirect of tab {} to archive", tab_id);
        vec![
            Effect::Navigate { tab_id, url: archive_url_for(&target) },
            Effect::ClearBadge { tab_id },
        ]
    }

    /// Explicit "archive this page" request from the popup or page button.
    pub fn redirect_to_archive(&mut self, tab_id: TabId, url: &str) -> Vec<Effect> {
        self.clear_pending(tab_id);
        vec![Effect::Navigate { tab_id, url: archive_url_for(url) }]
    }

    fn show_badge(&mut self, tab_id: TabId, url: String, kind: BadgeKind) -> Vec<Effect> {
        self.set_pending(tab_id, url, kind);
        vec![Effect::SetBadge { tab_id, badge: kind.badge() }]
    }
}

// =============================================================================
// Effect Execution
// =============================================================================

/// Browser-side executor of effects.
pub trait EffectSink {
    fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<(), CollaboratorError>;
    fn set_badge(&mut self, tab_id: TabId, badge: Badge) -> Result<(), CollaboratorError>;
    fn clear_badge(&mut self, tab_id: TabId) -> Result<(), CollaboratorError>;
}

/// An effect the sink could not perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFailure {
    pub effect: Effect,
    pub error: CollaboratorError,
}

/// Run every effect in order. Failures are logged and returned; they never
/// stop the remaining effects. Writes to a closed tab are expected and only
/// logged at debug level.
pub fn apply_effects(sink: &mut dyn EffectSink, effects: Vec<Effect>) -> Vec<EffectFailure> {
    let mut failures = Vec::new();

    for effect in effects {
        let result = match &effect {
            Effect::Navigate { tab_id, url } => sink.navigate(*tab_id, url),
            Effect::SetBadge { tab_id, badge } => sink.set_badge(*tab_id, *badge),
            Effect::ClearBadge { tab_id } => sink.clear_badge(*tab_id),
        };

        if let Err(error) = result {
            match error {
                CollaboratorError::TabGone(tab_id) => log::debug!("tab {} gone, skipped {:?}", tab_id, effect),
                ref other => log::warn!("tab {}: effect {:?} failed: {}", effect.tab_id(), effect, other),
            }
            failures.push(EffectFailure { effect, error });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RedirectMode;

    const ARTICLE: &str = "https://www.nytimes.com/2024/01/15/us/politics/story.html";
    const HOMEPAGE: &str = "https://www.nytimes.com/";

    fn automatic() -> Settings {
        Settings { enabled: true, redirect_mode: RedirectMode::Automatic }
    }

    fn manual() -> Settings {
        Settings { enabled: true, redirect_mode: RedirectMode::Manual }
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
        closed: Vec<TabId>,
    }

    impl EffectSink for RecordingSink {
        fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<(), CollaboratorError> {
            if self.closed.contains(&tab_id) {
                return Err(CollaboratorError::TabGone(tab_id));
            }
            self.calls.push(format!("navigate {} {}", tab_id, url));
            Ok(())
        }

        fn set_badge(&mut self, tab_id: TabId, badge: Badge) -> Result<(), CollaboratorError> {
            if self.closed.contains(&tab_id) {
                return Err(CollaboratorError::TabGone(tab_id));
            }
            self.calls.push(format!("badge {} {} {}", tab_id, badge.text, badge.color));
            Ok(())
        }

        fn clear_badge(&mut self, tab_id: TabId) -> Result<(), CollaboratorError> {
            if self.closed.contains(&tab_id) {
                return Err(CollaboratorError::TabGone(tab_id));
            }
            self.calls.push(format!("clear {}", tab_id));
            Ok(())
        }
    }

    #[test]
    fn test_automatic_article_navigates() {
        let mut tabs = TabCoordinator::new();
        let effects = tabs.on_before_navigate(1, 0, ARTICLE, &automatic());
        assert_eq!(effects, vec![Effect::Navigate { tab_id: 1, url: archive_url_for(ARTICLE) }]);
        assert_eq!(tabs.tab_state(1), TabState::Clean);
    }

    #[test]
    fn test_badge_then_close_leaves_nothing() {
        let mut tabs = TabCoordinator::new();
        let effects = tabs.on_before_navigate(7, 0, HOMEPAGE, &automatic());
        assert_eq!(effects, vec![Effect::SetBadge { tab_id: 7, badge: BadgeKind::Home.badge() }]);
        assert_eq!(tabs.pending_url(7), Some(HOMEPAGE));

        tabs.on_tab_removed(7);
        assert_eq!(tabs.pending_url(7), None);
        assert_eq!(tabs.pending_count(), 0);
    }

    #[test]
    fn test_last_navigation_wins() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(3, 0, HOMEPAGE, &manual());
        tabs.on_before_navigate(3, 0, ARTICLE, &manual());
        assert_eq!(
            tabs.tab_state(3),
            TabState::PendingBadge { url: ARTICLE.to_string(), kind: BadgeKind::Article }
        );
        assert_eq!(tabs.pending_count(), 1);
    }

    #[test]
    fn test_subframes_are_ignored() {
        let mut tabs = TabCoordinator::new();
        assert!(tabs.on_before_navigate(1, 5, ARTICLE, &automatic()).is_empty());
        assert_eq!(tabs.tab_state(1), TabState::Clean);
    }

    #[test]
    fn test_disabled_navigation_does_nothing() {
        let mut tabs = TabCoordinator::new();
        let disabled = Settings { enabled: false, redirect_mode: RedirectMode::Manual };
        assert!(tabs.on_before_navigate(1, 0, ARTICLE, &disabled).is_empty());
    }

    #[test]
    fn test_completion_clears_when_leaving_paywall() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(2, 0, HOMEPAGE, &manual());

        let effects = tabs.on_navigation_complete(2, "https://example.com/", &manual());
        assert_eq!(effects, vec![Effect::ClearBadge { tab_id: 2 }]);
        assert_eq!(tabs.tab_state(2), TabState::Clean);
    }

    #[test]
    fn test_completion_clears_when_disabled() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(2, 0, ARTICLE, &manual());

        let disabled = Settings { enabled: false, redirect_mode: RedirectMode::Manual };
        let effects = tabs.on_navigation_complete(2, ARTICLE, &disabled);
        assert_eq!(effects, vec![Effect::ClearBadge { tab_id: 2 }]);
        assert_eq!(tabs.pending_count(), 0);
    }

    #[test]
    fn test_completion_on_archive_clears() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(4, 0, HOMEPAGE, &automatic());
        let effects = tabs.on_navigation_complete(4, &archive_url_for(HOMEPAGE), &automatic());
        assert_eq!(effects, vec![Effect::ClearBadge { tab_id: 4 }]);
    }

    #[test]
    fn test_completion_reshows_badge() {
        let mut tabs = TabCoordinator::new();
        let effects = tabs.on_navigation_complete(5, ARTICLE, &manual());
        assert_eq!(effects, vec![Effect::SetBadge { tab_id: 5, badge: BadgeKind::Article.badge() }]);
        assert_eq!(tabs.pending_url(5), Some(ARTICLE));

        assert!(tabs.on_navigation_complete(6, ARTICLE, &automatic()).is_empty());
    }

    #[test]
    fn test_icon_click_uses_pending_url() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(8, 0, ARTICLE, &manual());

        let effects = tabs.on_action_clicked(8, Some("https://www.nytimes.com/somewhere-else"));
        assert_eq!(
            effects,
            vec![
                Effect::Navigate { tab_id: 8, url: archive_url_for(ARTICLE) },
                Effect::ClearBadge { tab_id: 8 },
            ]
        );
        assert_eq!(tabs.tab_state(8), TabState::Clean);
    }

    #[test]
    fn test_icon_click_falls_back_to_current_url() {
        let mut tabs = TabCoordinator::new();
        let effects = tabs.on_action_clicked(9, Some(HOMEPAGE));
        assert_eq!(effects[0], Effect::Navigate { tab_id: 9, url: archive_url_for(HOMEPAGE) });

        assert!(tabs.on_action_clicked(9, Some("https://example.com/story")).is_empty());
        assert!(tabs.on_action_clicked(9, None).is_empty());
    }

    #[test]
    fn test_redirect_to_archive_request() {
        let mut tabs = TabCoordinator::new();
        tabs.on_before_navigate(10, 0, HOMEPAGE, &manual());
        let effects = tabs.redirect_to_archive(10, "https://example.com/anything");
        assert_eq!(
            effects,
            vec![Effect::Navigate { tab_id: 10, url: archive_url_for("https://example.com/anything") }]
        );
        assert_eq!(tabs.pending_count(), 0);
    }

    #[test]
    fn test_custom_registry() {
        let mut tabs = TabCoordinator::with_registry(SiteRegistry::new(["startribune.com"]));
        assert!(tabs.on_before_navigate(1, 0, ARTICLE, &manual()).is_empty());
        let effects = tabs.on_before_navigate(1, 0, "https://www.startribune.com/", &manual());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_apply_effects_continues_past_failures() {
        let mut sink = RecordingSink { closed: vec![2], ..Default::default() };
        let effects = vec![
            Effect::SetBadge { tab_id: 2, badge: BadgeKind::Home.badge() },
            Effect::Navigate { tab_id: 1, url: "https://archive.ph/newest/x".to_string() },
            Effect::ClearBadge { tab_id: 1 },
        ];

        let failures = apply_effects(&mut sink, effects);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, CollaboratorError::TabGone(2));
        assert_eq!(failures[0].effect.tab_id(), 2);
        assert_eq!(sink.calls, vec!["navigate 1 https://archive.ph/newest/x", "clear 1"]);
    }

    #[test]
    fn test_effect_json_shape() {
        let json = serde_json::to_value(Effect::SetBadge { tab_id: 3, badge: BadgeKind::Article.badge() }).unwrap();
        assert_eq!(json["type"], "setBadge");
        assert_eq!(json["tabId"], 3);
        assert_eq!(json["badge"]["text"], "📚");
        assert_eq!(json["badge"]["color"], "#FF6B6B");
    }
}
