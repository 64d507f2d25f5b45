use std::fs;
use std::path::Path;

use aj_core::SiteRegistry;

/// Registry from `--sites`, or the built-in list when none was given.
pub fn load_registry(path: Option<&Path>) -> Result<SiteRegistry, String> {
    let path = match path {
        Some(path) => path,
        None => return Ok(SiteRegistry::default()),
    };

    let text = read_site_list(path)?;
    let registry = SiteRegistry::from_list_text(&text);
    if registry.is_empty() {
        return Err(format!("Site list '{}' contains no domains", path.display()));
    }

    log::info!("loaded {} domains from '{}'", registry.len(), path.display());
    Ok(registry)
}

pub fn read_site_list(path: &Path) -> Result<String, String> {
    fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}
