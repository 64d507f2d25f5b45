//! WebAssembly bindings for ArchiveJump
//!
//! The background script forwards browser events here and executes the
//! returned effects (`navigate`, `setBadge`, `clearBadge`) itself.

mod engine;
mod logging;

use std::sync::{Mutex, MutexGuard, OnceLock};

use serde::Serialize;
use wasm_bindgen::prelude::*;

use aj_core::{
    classify,
    policy::{archive_url_for, offers_archive_button},
    settings::{MemorySettingsStore, StoredSettings},
    types::{PageClassification, RedirectMode},
    url::hostname,
    Settings,
};

pub use engine::{EngineState, Request};

static ENGINE_STATE: OnceLock<Mutex<EngineState>> = OnceLock::new();

fn state() -> MutexGuard<'static, EngineState> {
    ENGINE_STATE
        .get_or_init(|| Mutex::new(EngineState::default()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::NULL)
}

fn parse_mode(mode: &str) -> Result<RedirectMode, JsValue> {
    mode.parse().map_err(|e: String| JsValue::from_str(&e))
}

// =============================================================================
// Setup
// =============================================================================

#[wasm_bindgen]
pub fn init_logging(level: &str) {
    logging::install(logging::parse_level(level));
}

/// Replace the built-in site list. Returns the number of domains loaded.
#[wasm_bindgen]
pub fn init_sites(list_text: &str) -> Result<u32, JsValue> {
    let count = state().load_sites(list_text).map_err(|e| JsValue::from_str(&e))?;
    Ok(count as u32)
}

#[wasm_bindgen]
pub fn get_state_info() -> JsValue {
    let state = state();
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"sites".into(), &JsValue::from(state.tabs.registry().len() as u32));
    let _ = js_sys::Reflect::set(&result, &"pendingTabs".into(), &JsValue::from(state.tabs.pending_count() as u32));
    let _ = js_sys::Reflect::set(&result, &"enabled".into(), &JsValue::from(state.settings.current().enabled));
    let _ = js_sys::Reflect::set(
        &result,
        &"redirectMode".into(),
        &JsValue::from_str(state.settings.current().redirect_mode.as_str()),
    );
    result.into()
}

// =============================================================================
// Settings
// =============================================================================

/// Settings to write on first install.
#[wasm_bindgen]
pub fn install_defaults() -> JsValue {
    let mut store = MemorySettingsStore::default();
    let mut state = state();
    if let Err(e) = state.settings.install_defaults(&mut store) {
        log::error!("failed to install defaults: {}", e);
    }
    to_js(store.stored())
}

/// Adopt values read from storage.
#[wasm_bindgen]
pub fn load_settings(enabled: Option<bool>, redirect_mode: Option<String>) -> JsValue {
    let store = MemorySettingsStore::new(StoredSettings { enabled, redirect_mode });
    let settings = state().settings.refresh(&store);
    to_js(&settings)
}

/// Storage change notification. Unknown mode values are ignored.
#[wasm_bindgen]
pub fn apply_settings_change(enabled: Option<bool>, redirect_mode: Option<String>) -> JsValue {
    let settings = state()
        .settings
        .apply_stored_change(&StoredSettings { enabled, redirect_mode });
    to_js(&settings)
}

#[wasm_bindgen]
pub fn get_settings() -> JsValue {
    to_js(&state().settings.current())
}

// =============================================================================
// Engine
// =============================================================================

#[wasm_bindgen]
pub fn is_paywalled_site(hostname: &str) -> bool {
    state().tabs.registry().contains_host(hostname)
}

#[wasm_bindgen]
pub fn is_article_page(url: &str) -> bool {
    aj_core::is_article_page(url)
}

#[wasm_bindgen]
pub fn classify_url(url: &str) -> JsValue {
    let verdict = classify(url);
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &result,
        &"isArticle".into(),
        &JsValue::from(verdict.classification == PageClassification::Article),
    );
    let _ = js_sys::Reflect::set(&result, &"rule".into(), &to_js(&verdict.rule));
    result.into()
}

#[wasm_bindgen]
pub fn archive_url(url: &str) -> String {
    archive_url_for(url)
}

#[wasm_bindgen]
pub fn extract_hostname(url: &str) -> Option<String> {
    hostname(url)
}

/// Decide for `url` with explicit settings, without touching tab state.
#[wasm_bindgen]
pub fn decide(url: &str, redirect_mode: &str, enabled: bool) -> Result<JsValue, JsValue> {
    let settings = Settings {
        enabled,
        redirect_mode: parse_mode(redirect_mode)?,
    };
    let action = state().tabs.policy().evaluate(url, &settings);
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"action".into(), &to_js(&action));
    let _ = js_sys::Reflect::set(&result, &"offerButton".into(), &JsValue::from(offers_archive_button(&action)));
    Ok(result.into())
}

// =============================================================================
// Tab Events
// =============================================================================

#[wasm_bindgen]
pub fn on_before_navigate(tab_id: i32, frame_id: i32, url: &str) -> JsValue {
    let mut state = state();
    let settings = state.settings.current();
    let effects = state.tabs.on_before_navigate(tab_id, frame_id, url, &settings);
    to_js(&effects)
}

#[wasm_bindgen]
pub fn on_navigation_complete(tab_id: i32, url: &str) -> JsValue {
    let mut state = state();
    let settings = state.settings.current();
    let effects = state.tabs.on_navigation_complete(tab_id, url, &settings);
    to_js(&effects)
}

#[wasm_bindgen]
pub fn on_tab_removed(tab_id: i32) {
    state().tabs.on_tab_removed(tab_id);
}

#[wasm_bindgen]
pub fn on_action_clicked(tab_id: i32, current_url: Option<String>) -> JsValue {
    let effects = state().tabs.on_action_clicked(tab_id, current_url.as_deref());
    to_js(&effects)
}

#[wasm_bindgen]
pub fn pending_url(tab_id: i32) -> Option<String> {
    state().tabs.pending_url(tab_id).map(|url| url.to_string())
}

/// Answer a runtime message (`JSON.stringify`-ed request object).
#[wasm_bindgen]
pub fn handle_message(request_json: &str, sender_tab_id: Option<i32>) -> JsValue {
    let reply = state().handle_message(request_json, sender_tab_id);
    to_js(&reply)
}
