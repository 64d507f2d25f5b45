//! Background-script state and the runtime message protocol
//!
//! Everything here works on plain Rust and `serde_json` values so it can be
//! tested natively; `lib.rs` converts at the JS boundary.

use serde::Deserialize;
use serde_json::{json, Value};

use aj_core::error::CollaboratorError;
use aj_core::policy::archive_url_for;
use aj_core::settings::{SettingsCache, SettingsPatch, SettingsStore, StoredSettings};
use aj_core::tabs::TabCoordinator;
use aj_core::types::TabId;
use aj_core::url::hostname;
use aj_core::{is_article_page, SiteRegistry};

/// Everything the background script keeps between events.
#[derive(Debug, Default)]
pub struct EngineState {
    pub settings: SettingsCache,
    pub tabs: TabCoordinator,
}

/// Settings writes the host still has to persist.
#[derive(Debug, Default)]
pub struct OutgoingWrite {
    pub patch: Option<SettingsPatch>,
}

impl SettingsStore for OutgoingWrite {
    fn load(&self) -> Result<StoredSettings, CollaboratorError> {
        Err(CollaboratorError::Other("settings are loaded by the host".to_string()))
    }

    fn save(&mut self, patch: &SettingsPatch) -> Result<(), CollaboratorError> {
        let merged = match self.patch {
            Some(mut existing) => {
                existing.enabled = patch.enabled.or(existing.enabled);
                existing.redirect_mode = patch.redirect_mode.or(existing.redirect_mode);
                existing
            }
            None => *patch,
        };
        self.patch = Some(merged);
        Ok(())
    }
}

/// Runtime message sent by the popup or content script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetSettings,
    UpdateSettings {
        settings: SettingsPatch,
    },
    CheckPaywall {
        url: String,
    },
    IsArticlePage {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    RedirectToArchive {
        url: String,
        #[serde(default)]
        tab_id: Option<TabId>,
    },
}

fn failure(error: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

impl EngineState {
    /// Replace the registry with a parsed site list. Returns the domain
    /// count; a list without domains leaves the current registry in place.
    pub fn load_sites(&mut self, list_text: &str) -> Result<usize, String> {
        let registry = SiteRegistry::from_list_text(list_text);
        if registry.is_empty() {
            log::warn!("site list contains no domains, keeping {} registered", self.tabs.registry().len());
            return Err("Site list contains no domains".to_string());
        }
        let count = registry.len();
        self.tabs.set_registry(registry);
        log::info!("site registry loaded: {} domains", count);
        Ok(count)
    }

    /// Parse and answer a runtime message.
    pub fn handle_message(&mut self, request_json: &str, sender_tab: Option<TabId>) -> Value {
        match serde_json::from_str::<Request>(request_json) {
            Ok(request) => self.handle_request(request, sender_tab),
            Err(e) => {
                log::warn!("bad runtime message: {}", e);
                failure(e)
            }
        }
    }

    pub fn handle_request(&mut self, request: Request, sender_tab: Option<TabId>) -> Value {
        match request {
            Request::GetSettings => {
                let settings = self.settings.current();
                json!({ "enabled": settings.enabled, "redirectMode": settings.redirect_mode })
            }
            Request::UpdateSettings { settings } => {
                let mut write = OutgoingWrite::default();
                match self.settings.update(&mut write, settings) {
                    Ok(current) => json!({
                        "success": true,
                        "settings": current,
                        "write": write.patch,
                    }),
                    Err(e) => failure(e),
                }
            }
            Request::CheckPaywall { url } => {
                let is_paywalled = hostname(&url)
                    .map(|host| self.tabs.registry().contains_host(&host))
                    .unwrap_or(false);
                json!({ "isPaywalled": is_paywalled })
            }
            Request::IsArticlePage { url } => json!({ "isArticle": is_article_page(&url) }),
            Request::RedirectToArchive { url, tab_id } => match sender_tab.or(tab_id) {
                Some(tab_id) => {
                    let effects = self.tabs.redirect_to_archive(tab_id, &url);
                    json!({ "success": true, "effects": effects })
                }
                None => json!({
                    "success": false,
                    "error": "No active tab found",
                    "archiveUrl": archive_url_for(&url),
                }),
            },
        }
    }
}
