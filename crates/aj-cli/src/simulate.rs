use std::collections::HashSet;

use serde::Deserialize;

use aj_core::settings::{MemorySettingsStore, SettingsCache, SettingsPatch, StoredSettings};
use aj_core::tabs::{apply_effects, EffectSink};
use aj_core::{Badge, CollaboratorError, Settings, SiteRegistry, TabCoordinator, TabId};

pub struct SimulateOptions {
    pub events_path: String,
    pub settings: Settings,
}

/// One line of an event script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    Navigate {
        tab_id: TabId,
        url: String,
        #[serde(default)]
        frame_id: i32,
    },
    #[serde(rename_all = "camelCase")]
    Complete { tab_id: TabId, url: String },
    #[serde(rename_all = "camelCase")]
    Click {
        tab_id: TabId,
        #[serde(default)]
        url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Close { tab_id: TabId },
    #[serde(rename_all = "camelCase")]
    Archive { tab_id: TabId, url: String },
    Settings(SettingsPatch),
}

/// Sink that records what a browser would have been asked to do.
/// Closed tabs reject writes the way a real tab API does.
#[derive(Default)]
struct RecordingSink {
    lines: Vec<String>,
    closed: HashSet<TabId>,
}

impl RecordingSink {
    fn check_open(&self, tab_id: TabId) -> Result<(), CollaboratorError> {
        if self.closed.contains(&tab_id) {
            Err(CollaboratorError::TabGone(tab_id))
        } else {
            Ok(())
        }
    }
}

impl EffectSink for RecordingSink {
    fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<(), CollaboratorError> {
        self.check_open(tab_id)?;
        self.lines.push(format!("  tab {}: navigate -> {}", tab_id, url));
        Ok(())
    }

    fn set_badge(&mut self, tab_id: TabId, badge: Badge) -> Result<(), CollaboratorError> {
        self.check_open(tab_id)?;
        self.lines.push(format!("  tab {}: badge {} {}", tab_id, badge.text, badge.color));
        Ok(())
    }

    fn clear_badge(&mut self, tab_id: TabId) -> Result<(), CollaboratorError> {
        self.check_open(tab_id)?;
        self.lines.push(format!("  tab {}: clear badge", tab_id));
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimulationReport {
    pub lines: Vec<String>,
    pub failures: usize,
    pub pending_tabs: usize,
    pub settings: Settings,
}

pub fn run_simulate(registry: SiteRegistry, opts: SimulateOptions) -> Result<(), String> {
    let text = std::fs::read_to_string(&opts.events_path)
        .map_err(|e| format!("Failed to read events '{}': {}", opts.events_path, e))?;
    let events = parse_events(&text);
    if events.is_empty() {
        return Err(format!("Loaded 0 events from {}", opts.events_path));
    }

    let report = simulate(registry, opts.settings, &events);
    for line in &report.lines {
        println!("{}", line);
    }
    println!();
    println!("Events:       {}", events.len());
    println!("Failed:       {}", report.failures);
    println!("Pending tabs: {}", report.pending_tabs);
    println!(
        "Settings:     enabled={} mode={}",
        report.settings.enabled, report.settings.redirect_mode
    );

    Ok(())
}

/// Parse a JSON-lines event script. Blank lines and `#` comments are
/// skipped; lines that fail to parse are skipped with a warning.
pub fn parse_events(text: &str) -> Vec<Event> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<Event>(trimmed) {
            Ok(event) => out.push(event),
            Err(e) => log::warn!("events line {}: {}", idx + 1, e),
        }
    }
    out
}

pub fn simulate(registry: SiteRegistry, settings: Settings, events: &[Event]) -> SimulationReport {
    let mut tabs = TabCoordinator::with_registry(registry);
    let mut store = MemorySettingsStore::new(StoredSettings::from(settings));
    let mut cache = SettingsCache::default();
    cache.refresh(&store);

    let mut sink = RecordingSink::default();
    let mut failures = 0usize;

    for (idx, event) in events.iter().enumerate() {
        let current = cache.current();
        let effects = match event {
            Event::Navigate { tab_id, url, frame_id } => {
                sink.lines.push(format!("#{} navigate tab {} {}", idx + 1, tab_id, url));
                tabs.on_before_navigate(*tab_id, *frame_id, url, &current)
            }
            Event::Complete { tab_id, url } => {
                sink.lines.push(format!("#{} complete tab {} {}", idx + 1, tab_id, url));
                tabs.on_navigation_complete(*tab_id, url, &current)
            }
            Event::Click { tab_id, url } => {
                sink.lines.push(format!("#{} click tab {}", idx + 1, tab_id));
                tabs.on_action_clicked(*tab_id, url.as_deref())
            }
            Event::Close { tab_id } => {
                sink.lines.push(format!("#{} close tab {}", idx + 1, tab_id));
                tabs.on_tab_removed(*tab_id);
                sink.closed.insert(*tab_id);
                Vec::new()
            }
            Event::Archive { tab_id, url } => {
                sink.lines.push(format!("#{} archive tab {} {}", idx + 1, tab_id, url));
                tabs.redirect_to_archive(*tab_id, url)
            }
            Event::Settings(patch) => {
                match cache.update(&mut store, *patch) {
                    Ok(updated) => sink.lines.push(format!(
                        "#{} settings enabled={} mode={}",
                        idx + 1,
                        updated.enabled,
                        updated.redirect_mode
                    )),
                    Err(e) => sink.lines.push(format!("#{} settings failed: {}", idx + 1, e)),
                }
                Vec::new()
            }
        };

        for failure in apply_effects(&mut sink, effects) {
            failures += 1;
            sink.lines.push(format!("  failed: {}", failure.error));
        }
    }

    SimulationReport {
        lines: sink.lines,
        failures,
        pending_tabs: tabs.pending_count(),
        settings: cache.current(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aj_core::RedirectMode;

    const SCRIPT: &str = r#"
# homepage badge, then an article redirect
{"event":"navigate","tabId":1,"url":"https://www.nytimes.com/"}
{"event":"navigate","tabId":1,"url":"https://www.nytimes.com/2024/01/15/us/politics/story.html"}
{"event":"settings","redirectMode":"manual"}
{"event":"navigate","tabId":2,"url":"https://www.wsj.com/articles/some-piece"}
{"event":"click","tabId":2}
{"event":"navigate","tabId":3,"url":"https://www.ft.com/"}
{"event":"close","tabId":3}
{"event":"navigate","tabId":3,"url":"https://www.ft.com/"}
not json
"#;

    #[test]
    fn test_parse_events_skips_noise() {
        let events = parse_events(SCRIPT);
        assert_eq!(events.len(), 8);
        assert_eq!(
            events[2],
            Event::Settings(SettingsPatch { enabled: None, redirect_mode: Some(RedirectMode::Manual) })
        );
        assert_eq!(
            events[0],
            Event::Navigate { tab_id: 1, url: "https://www.nytimes.com/".to_string(), frame_id: 0 }
        );
    }

    #[test]
    fn test_simulate_script() {
        let events = parse_events(SCRIPT);
        let report = simulate(SiteRegistry::default(), Settings::default(), &events);

        assert!(report.lines.contains(&"  tab 1: badge 🏠 #FFA500".to_string()));
        assert!(report.lines.contains(
            &"  tab 1: navigate -> https://archive.ph/newest/https://www.nytimes.com/2024/01/15/us/politics/story.html"
                .to_string()
        ));
        assert!(report.lines.contains(
            &"  tab 2: navigate -> https://archive.ph/newest/https://www.wsj.com/articles/some-piece".to_string()
        ));
        assert_eq!(report.settings.redirect_mode, RedirectMode::Manual);
        // badge write to the closed tab 3 fails, its pending URL is still recorded
        assert_eq!(report.failures, 1);
        assert_eq!(report.pending_tabs, 1);
    }
}
