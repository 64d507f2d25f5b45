//! Core type definitions for ArchiveJump
//!
//! These types cross the boundary between the decision engine and the
//! extension glue, so they all serialize with camelCase field names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Browser tab identifier.
pub type TabId = i32;

/// Frame id of a top-level document.
pub const MAIN_FRAME_ID: i32 = 0;

// =============================================================================
// Redirect Mode
// =============================================================================

/// How paywalled articles are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Redirect articles immediately, badge homepages
    #[default]
    Automatic,
    /// Only ever badge, the user triggers the redirect
    Manual,
}

impl RedirectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for RedirectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown redirect mode '{}'", other)),
        }
    }
}

impl fmt::Display for RedirectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Page Classification
// =============================================================================

/// Page type verdict for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageClassification {
    Article,
    NonArticle,
}

impl PageClassification {
    #[inline]
    pub fn is_article(&self) -> bool {
        matches!(self, Self::Article)
    }
}

// =============================================================================
// Badges
// =============================================================================

/// Which badge a pending tab shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeKind {
    /// Paywalled article waiting for a manual redirect
    Article,
    /// Paywalled homepage or section page
    Home,
}

impl BadgeKind {
    pub fn for_classification(classification: PageClassification) -> Self {
        match classification {
            PageClassification::Article => Self::Article,
            PageClassification::NonArticle => Self::Home,
        }
    }

    /// Display parameters for this badge.
    pub fn badge(&self) -> Badge {
        match self {
            Self::Article => Badge { text: "📚", color: "#FF6B6B" },
            Self::Home => Badge { text: "🏠", color: "#FFA500" },
        }
    }
}

/// Badge text and background color handed to the badge collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: &'static str,
    pub color: &'static str,
}

// =============================================================================
// Actions
// =============================================================================

/// Outcome of a single decision pass. A description of a side effect,
/// never the effect itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Send the tab to the archived copy right away
    #[serde(rename_all = "camelCase")]
    ImmediateRedirect { target_url: String },
    /// Badge the tab and remember the URL for a manual redirect
    #[serde(rename_all = "camelCase")]
    ShowBadge { kind: BadgeKind, store_url: String },
    /// Remove any badge from the tab
    ClearBadge,
    /// Nothing to do
    NoOp,
}

impl Action {
    #[inline]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Name used in logs and the wasm bindings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImmediateRedirect { .. } => "immediateRedirect",
            Self::ShowBadge { .. } => "showBadge",
            Self::ClearBadge => "clearBadge",
            Self::NoOp => "noOp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_mode_parse() {
        assert_eq!("automatic".parse::<RedirectMode>(), Ok(RedirectMode::Automatic));
        assert_eq!("manual".parse::<RedirectMode>(), Ok(RedirectMode::Manual));
        assert!("Manual".parse::<RedirectMode>().is_err());
        assert_eq!(RedirectMode::default(), RedirectMode::Automatic);
    }

    #[test]
    fn test_badge_display_parameters() {
        assert_eq!(BadgeKind::Article.badge(), Badge { text: "📚", color: "#FF6B6B" });
        assert_eq!(BadgeKind::Home.badge(), Badge { text: "🏠", color: "#FFA500" });
    }

    #[test]
    fn test_action_json_shape() {
        let action = Action::ShowBadge {
            kind: BadgeKind::Home,
            store_url: "https://www.nytimes.com/".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "showBadge");
        assert_eq!(json["kind"], "home");
        assert_eq!(json["storeUrl"], "https://www.nytimes.com/");

        let json = serde_json::to_value(Action::NoOp).unwrap();
        assert_eq!(json["type"], "noOp");
    }
}
