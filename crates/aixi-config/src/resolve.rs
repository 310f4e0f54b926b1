//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Where an experiment file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Outcome of path resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The experiment file to load, or None for built-in defaults.
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable naming an experiment file directly.
pub const ENV_CONFIG_PATH: &str = "AIXI_CONFIG";

/// Environment variable naming a directory holding `experiment.toml`.
pub const ENV_CONFIG_DIR: &str = "AIXI_CONFIG_DIR";

/// Application name for XDG directories.
const APP_NAME: &str = "aixi";

/// Standard experiment file names, in lookup order.
const CONFIG_FILENAMES: [&str; 2] = ["experiment.toml", "experiment.json"];

/// Resolve the experiment file using the standard resolution order.
///
/// 1. Explicit CLI path. Returned even if missing, so the loader reports it.
/// 2. `AIXI_CONFIG` (direct path)
/// 3. `AIXI_CONFIG_DIR` + standard file name
/// 4. XDG config directory (`~/.config/aixi/`)
/// 5. Built-in defaults (None)
pub fn resolve_config_path(cli_path: Option<&Path>) -> ResolvedPath {
    if let Some(path) = cli_path {
        return ResolvedPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ResolvedPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&dir)) {
            return ResolvedPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(xdg_config) = dirs::config_dir() {
        if let Some(path) = find_in_dir(&xdg_config.join(APP_NAME)) {
            return ResolvedPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    ResolvedPath::default()
}

/// First standard experiment file present in `dir`.
pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_wins_even_if_missing() {
        let resolved = resolve_config_path(Some(Path::new("/nonexistent/experiment.toml")));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(
            resolved.path.as_deref(),
            Some(Path::new("/nonexistent/experiment.toml"))
        );
    }

    #[test]
    fn find_in_dir_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("experiment.json"), "{}").unwrap();
        assert_eq!(
            find_in_dir(dir.path()),
            Some(dir.path().join("experiment.json"))
        );
        std::fs::write(dir.path().join("experiment.toml"), "").unwrap();
        assert_eq!(
            find_in_dir(dir.path()),
            Some(dir.path().join("experiment.toml"))
        );
    }

    #[test]
    fn source_display() {
        assert_eq!(ConfigSource::BuiltinDefault.to_string(), "builtin default");
        assert_eq!(ConfigSource::CliArgument.to_string(), "CLI argument");
    }
}
