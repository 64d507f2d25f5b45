//! User settings and the adapter that caches them
//!
//! The engine takes a [`Settings`] snapshot per call. [`SettingsCache`]
//! owns the lifecycle of that snapshot: initial load, change
//! notifications and write-through updates against a [`SettingsStore`].

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::types::RedirectMode;

// =============================================================================
// Settings
// =============================================================================

/// Effective settings for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub redirect_mode: RedirectMode,
}

fn default_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            redirect_mode: RedirectMode::default(),
        }
    }
}

impl Settings {
    /// Resolve raw stored values. Only an explicit `false` disables, and a
    /// missing or unrecognised mode falls back to automatic.
    pub fn from_stored(stored: &StoredSettings) -> Self {
        let redirect_mode = match stored.redirect_mode.as_deref() {
            None | Some("") => RedirectMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{}, using {}", e, RedirectMode::default());
                RedirectMode::default()
            }),
        };

        Self {
            enabled: stored.enabled != Some(false),
            redirect_mode,
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = patch.redirect_mode {
            self.redirect_mode = mode;
        }
    }
}

/// Settings exactly as found in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub redirect_mode: Option<String>,
}

impl From<Settings> for StoredSettings {
    fn from(settings: Settings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            redirect_mode: Some(settings.redirect_mode.as_str().to_string()),
        }
    }
}

/// Partial settings update; also the shape of a change notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_mode: Option<RedirectMode>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.redirect_mode.is_none()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            redirect_mode: Some(settings.redirect_mode),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Persistent key/value settings storage provided by the host.
pub trait SettingsStore {
    fn load(&self) -> Result<StoredSettings, CollaboratorError>;
    fn save(&mut self, patch: &SettingsPatch) -> Result<(), CollaboratorError>;
}

/// In-memory store, used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    stored: StoredSettings,
}

impl MemorySettingsStore {
    pub fn new(stored: StoredSettings) -> Self {
        Self { stored }
    }

    pub fn stored(&self) -> &StoredSettings {
        &self.stored
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<StoredSettings, CollaboratorError> {
        Ok(self.stored.clone())
    }

    fn save(&mut self, patch: &SettingsPatch) -> Result<(), CollaboratorError> {
        if let Some(enabled) = patch.enabled {
            self.stored.enabled = Some(enabled);
        }
        if let Some(mode) = patch.redirect_mode {
            self.stored.redirect_mode = Some(mode.as_str().to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Current settings snapshot, kept fresh from a [`SettingsStore`].
#[derive(Debug, Clone, Default)]
pub struct SettingsCache {
    current: Settings,
}

impl SettingsCache {
    pub fn new(current: Settings) -> Self {
        Self { current }
    }

    /// The snapshot to hand to the engine.
    #[inline]
    pub fn current(&self) -> Settings {
        self.current
    }

    /// Write defaults on first install and adopt them.
    pub fn install_defaults(&mut self, store: &mut dyn SettingsStore) -> Result<(), CollaboratorError> {
        let defaults = Settings::default();
        store.save(&SettingsPatch::from(defaults))?;
        self.current = defaults;
        log::info!("installed default settings: {:?}", defaults);
        Ok(())
    }

    /// Reload from storage. A failed load keeps the previous snapshot.
    pub fn refresh(&mut self, store: &dyn SettingsStore) -> Settings {
        match store.load() {
            Ok(stored) => {
                self.current = Settings::from_stored(&stored);
                log::debug!("settings loaded: {:?}", self.current);
            }
            Err(e) => log::error!("failed to load settings, keeping {:?}: {}", self.current, e),
        }
        self.current
    }

    /// Change notification from storage.
    pub fn apply_change(&mut self, change: &SettingsPatch) -> Settings {
        self.current.apply(change);
        log::debug!("settings updated: {:?}", self.current);
        self.current
    }

    /// Change notification carrying raw storage values. An unknown mode is
    /// ignored; the other fields still apply.
    pub fn apply_stored_change(&mut self, change: &StoredSettings) -> Settings {
        let redirect_mode = change.redirect_mode.as_deref().and_then(|raw| match raw.parse::<RedirectMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                log::warn!("ignoring settings change: {}", e);
                None
            }
        });
        self.apply_change(&SettingsPatch { enabled: change.enabled, redirect_mode })
    }

    /// Update the snapshot and write the patch through to storage.
    ///
    /// Choosing a redirect mode while disabled re-enables in the same write.
    /// The snapshot is updated even when the write fails; the error is
    /// returned so the caller can report it.
    pub fn update(
        &mut self,
        store: &mut dyn SettingsStore,
        patch: SettingsPatch,
    ) -> Result<Settings, CollaboratorError> {
        let mut patch = patch;
        if patch.redirect_mode.is_some() && patch.enabled.is_none() && !self.current.enabled {
            log::debug!("redirect mode changed while disabled, enabling");
            patch.enabled = Some(true);
        }

        self.current.apply(&patch);
        store.save(&patch)?;
        Ok(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl SettingsStore for FailingStore {
        fn load(&self) -> Result<StoredSettings, CollaboratorError> {
            Err(CollaboratorError::Storage("quota exceeded".to_string()))
        }

        fn save(&mut self, _patch: &SettingsPatch) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::Storage("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.enabled);
        assert_eq!(settings.redirect_mode, RedirectMode::Automatic);
    }

    #[test]
    fn test_from_stored_is_lenient() {
        assert_eq!(Settings::from_stored(&StoredSettings::default()), Settings::default());

        let stored = StoredSettings { enabled: Some(false), redirect_mode: Some("manual".to_string()) };
        assert_eq!(
            Settings::from_stored(&stored),
            Settings { enabled: false, redirect_mode: RedirectMode::Manual }
        );

        let stored = StoredSettings { enabled: None, redirect_mode: Some("sideways".to_string()) };
        assert_eq!(Settings::from_stored(&stored), Settings::default());

        let stored = StoredSettings { enabled: Some(true), redirect_mode: Some(String::new()) };
        assert_eq!(Settings::from_stored(&stored).redirect_mode, RedirectMode::Automatic);
    }

    #[test]
    fn test_settings_json() {
        let settings: Settings = serde_json::from_str(r#"{"redirectMode":"manual"}"#).unwrap();
        assert_eq!(settings, Settings { enabled: true, redirect_mode: RedirectMode::Manual });

        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, r#"{"enabled":true,"redirectMode":"automatic"}"#);

        let patch: SettingsPatch = serde_json::from_str(r#"{"enabled":false}"#).unwrap();
        assert_eq!(patch, SettingsPatch { enabled: Some(false), redirect_mode: None });
    }

    #[test]
    fn test_install_and_refresh() {
        let mut store = MemorySettingsStore::default();
        let mut cache = SettingsCache::default();
        cache.install_defaults(&mut store).unwrap();
        assert_eq!(store.stored().enabled, Some(true));
        assert_eq!(store.stored().redirect_mode.as_deref(), Some("automatic"));

        store.save(&SettingsPatch { enabled: None, redirect_mode: Some(RedirectMode::Manual) }).unwrap();
        assert_eq!(cache.refresh(&store).redirect_mode, RedirectMode::Manual);
    }

    #[test]
    fn test_refresh_failure_keeps_snapshot() {
        let mut cache = SettingsCache::new(Settings { enabled: false, redirect_mode: RedirectMode::Manual });
        let settings = cache.refresh(&FailingStore);
        assert_eq!(settings, Settings { enabled: false, redirect_mode: RedirectMode::Manual });
    }

    #[test]
    fn test_apply_change() {
        let mut cache = SettingsCache::default();
        cache.apply_change(&SettingsPatch { enabled: Some(false), redirect_mode: None });
        assert_eq!(cache.current(), Settings { enabled: false, redirect_mode: RedirectMode::Automatic });
    }

    #[test]
    fn test_stored_change_ignores_unknown_mode() {
        let mut cache = SettingsCache::new(Settings { enabled: true, redirect_mode: RedirectMode::Manual });
        let settings = cache.apply_stored_change(&StoredSettings {
            enabled: Some(false),
            redirect_mode: Some("sometimes".to_string()),
        });
        assert_eq!(settings, Settings { enabled: false, redirect_mode: RedirectMode::Manual });

        let settings = cache.apply_stored_change(&StoredSettings { enabled: None, redirect_mode: Some("automatic".to_string()) });
        assert_eq!(settings, Settings { enabled: false, redirect_mode: RedirectMode::Automatic });
    }

    #[test]
    fn test_mode_change_reenables() {
        let mut store = MemorySettingsStore::default();
        let mut cache = SettingsCache::new(Settings { enabled: false, redirect_mode: RedirectMode::Automatic });

        let settings = cache
            .update(&mut store, SettingsPatch { enabled: None, redirect_mode: Some(RedirectMode::Manual) })
            .unwrap();
        assert_eq!(settings, Settings { enabled: true, redirect_mode: RedirectMode::Manual });
        assert_eq!(store.stored().enabled, Some(true));

        // explicit enabled wins
        let settings = cache
            .update(&mut store, SettingsPatch { enabled: Some(false), redirect_mode: Some(RedirectMode::Automatic) })
            .unwrap();
        assert!(!settings.enabled);
    }

    #[test]
    fn test_update_reports_store_failure() {
        let mut cache = SettingsCache::default();
        let result = cache.update(&mut FailingStore, SettingsPatch { enabled: Some(false), redirect_mode: None });
        assert!(matches!(result, Err(CollaboratorError::Storage(_))));
        assert!(!cache.current().enabled);
    }
}
