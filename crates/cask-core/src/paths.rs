use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Returns the cask state directory, or None if the user's home cannot be resolved.
pub fn try_cask_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("CASK_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".cask"))
}

/// Downloaded archives: ~/.cask/cache
pub fn cache_path() -> Option<PathBuf> {
    try_cask_home().map(|h| h.join("cache"))
}

/// Applications directory the install artifact is placed into.
///
/// `CASK_APPDIR` overrides the system default of `/Applications`.
pub fn applications_dir() -> PathBuf {
    std::env::var_os("CASK_APPDIR").map_or_else(|| PathBuf::from("/Applications"), PathBuf::from)
}

/// Expand a leading `~` against `home`. Other paths are returned unchanged.
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
