//! Config directory discovery.

use std::path::PathBuf;

/// Application directory name under the platform config dir.
const APP_NAME: &str = "portico";

/// Environment variable to override the config directory.
///
/// When set, this takes precedence over the platform default.
pub const CONFIG_DIR_ENV: &str = "PORTICO_CONFIG_DIR";

/// Get the config directory for portico.
///
/// Checks `PORTICO_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/portico` on Linux, `~/Library/Application Support/portico` on macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Expand `~/` to the home directory.
pub(crate) fn expand_path(path: &std::path::Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
