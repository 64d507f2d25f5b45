//! ArchiveJump Core Library
//!
//! This crate decides, for each navigation, whether a paywalled page should
//! be sent to its archived copy, badged for a manual redirect, or left
//! alone.
//!
//! # Architecture
//!
//! The decision is a pure function of the URL and a settings snapshot. It
//! never performs I/O: the result is an [`Action`] value, and the
//! [`TabCoordinator`] turns actions into [`tabs::Effect`]s for the host to
//! execute.
//!
//! # Modules
//!
//! - `sites`: Paywalled site registry and archive-host loop guard
//! - `classifier`: Article vs non-article classification from the URL
//! - `policy`: Redirect policy combining registry, classifier and mode
//! - `tabs`: Per-tab pending state and effect execution
//! - `settings`: User settings snapshot and its cache adapter
//! - `url`: URL splitting without a full parser
//! - `types`: Shared type definitions
//! - `error`: Collaborator errors

pub mod classifier;
pub mod error;
pub mod policy;
pub mod settings;
pub mod sites;
pub mod tabs;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use classifier::{classify, is_article_page, Rule, Verdict};
pub use error::CollaboratorError;
pub use policy::{archive_url_for, decide, evaluate, RedirectPolicy};
pub use settings::{Settings, SettingsCache, SettingsPatch, SettingsStore};
pub use sites::{is_archive_host, is_paywalled_site, SiteRegistry};
pub use tabs::{apply_effects, Effect, EffectSink, TabCoordinator, TabState};
pub use types::{Action, Badge, BadgeKind, PageClassification, RedirectMode, TabId};
