//! Errors reported by host collaborators
//!
//! Engine functions never fail. Everything here comes from the storage,
//! tab and badge APIs the host provides.

use crate::types::TabId;

/// Error type for collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Tab {0} no longer exists")]
    TabGone(TabId),
    #[error("Navigation of tab {tab_id} failed: {reason}")]
    Navigation { tab_id: TabId, reason: String },
    #[error("Badge update for tab {tab_id} failed: {reason}")]
    Badge { tab_id: TabId, reason: String },
    #[error("{0}")]
    Other(String),
}
