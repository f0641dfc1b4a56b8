//! Optional config file loading. Search order: ./mangascrape.toml, then
//! $XDG_CONFIG_HOME/mangascrape/config.toml (or ~/.config/mangascrape/config.toml).

use serde::Deserialize;

use crate::scraper::SelectorSet;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Site origin used for search and title pages.
    pub origin: Option<String>,
    /// Relay prefix; the percent-encoded target URL is appended to it.
    pub relay_prefix: Option<String>,
    /// Set to false to fetch title and chapter pages directly.
    pub relay: Option<bool>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Parse the body of non-2xx responses instead of failing the flow.
    pub accept_error_status: Option<bool>,
    /// Selector rule overrides. Keys not given keep their built-in values.
    pub selectors: Option<SelectorSet>,
}

/// Search order: (1) ./mangascrape.toml, (2) $XDG_CONFIG_HOME/mangascrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("mangascrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("mangascrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!(path = %path.display(), "loaded config");
            return Ok(Some(config));
        }
    }
    Ok(None)
}
