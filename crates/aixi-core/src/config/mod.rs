//! Experiment loading for aixi-core.
//!
//! This module handles:
//! - Locating the experiment file (CLI > env > XDG > defaults)
//! - Parsing TOML or JSON, chosen by file extension
//! - Schema version and semantic validation
//! - Config snapshots for run provenance

pub use aixi_config::preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use aixi_config::validate::ValidationError;
pub use aixi_config::{ConfigSnapshot, ExperimentConfig};

use std::path::{Path, PathBuf};

use aixi_config::{resolve_config_path, validate_experiment, ConfigSource, ResolvedPath};
use thiserror::Error;

/// Errors that can occur while loading an experiment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Experiment file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in experiment file {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in experiment file {path}: {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    UnknownPreset(#[from] PresetError),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 12,
            ConfigError::JsonParse { .. } | ConfigError::TomlParse { .. } => 13,
            ConfigError::UnknownPreset(_) => 14,
            ConfigError::ValidationError(e) => e.code(),
            ConfigError::IoError { .. } => 60,
            ConfigError::VersionMismatch { .. } => 66,
        }
    }
}

/// File formats accepted for experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// How to find the experiment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit experiment file (highest priority).
    pub path: Option<PathBuf>,
    /// Built-in preset; ignored when `path` is set.
    pub preset: Option<String>,
}

/// A loaded experiment with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub experiment: ExperimentConfig,
    /// Where the experiment came from.
    pub resolved: ResolvedPath,
    /// Raw file content, kept for hashing.
    pub raw: Option<String>,
    pub preset: Option<PresetName>,
}

impl ResolvedConfig {
    /// Create a config snapshot for telemetry and summaries.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.experiment, &self.resolved, self.raw.as_deref())
    }

    /// Label for logs.
    pub fn label(&self) -> String {
        match (&self.resolved.path, self.preset) {
            (Some(path), _) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.experiment.label().to_string()),
            (None, Some(preset)) => format!("preset:{}", preset),
            (None, None) => self.experiment.label().to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.resolved.source == ConfigSource::BuiltinDefault && self.preset.is_none()
    }
}

/// Parse experiment text without touching the filesystem.
pub fn parse_experiment(
    text: &str,
    format: ConfigFormat,
    path: &Path,
) -> Result<ExperimentConfig, ConfigError> {
    match format {
        ConfigFormat::Json => serde_json::from_str(text).map_err(|source| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(text).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read, parse and version-check one experiment file.
pub fn load_experiment_file(path: &Path) -> Result<(ExperimentConfig, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let experiment = parse_experiment(&content, ConfigFormat::from_path(path), path)?;

    if experiment.schema_version != aixi_config::CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            path: path.to_path_buf(),
            expected: aixi_config::CONFIG_SCHEMA_VERSION.to_string(),
            actual: experiment.schema_version,
        });
    }

    Ok((experiment, content))
}

/// Load an experiment with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI path
/// 2. A named preset
/// 3. `AIXI_CONFIG` / `AIXI_CONFIG_DIR`
/// 4. XDG config home (`~/.config/aixi/experiment.toml`)
/// 5. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let (experiment, resolved, raw, preset) = match (&options.path, &options.preset) {
        (None, Some(name)) => {
            let preset: PresetName = name.parse()?;
            (get_preset(preset), ResolvedPath::default(), None, Some(preset))
        }
        _ => {
            let resolved = resolve_config_path(options.path.as_deref());
            match &resolved.path {
                Some(path) => {
                    let (experiment, raw) = load_experiment_file(path)?;
                    (experiment, resolved, Some(raw), None)
                }
                None => (ExperimentConfig::default(), resolved, None, None),
            }
        }
    };

    validate_experiment(&experiment)?;

    Ok(ResolvedConfig {
        experiment,
        resolved,
        raw,
        preset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aixi_config::EnvironmentConfig;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn options(path: PathBuf) -> ConfigOptions {
        ConfigOptions {
            path: Some(path),
            preset: None,
        }
    }

    #[test]
    fn test_load_toml_experiment() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tiger.toml",
            r#"
                seed = 3
                [environment]
                kind = "extended_tiger"
                listen_accuracy = 0.9
                [agent]
                ct_depth = 12
            "#,
        );
        let config = load_config(&options(path.clone())).unwrap();
        assert_eq!(config.resolved.source, ConfigSource::CliArgument);
        assert_eq!(config.experiment.seed, Some(3));
        assert_eq!(
            config.experiment.environment,
            EnvironmentConfig::ExtendedTiger {
                listen_accuracy: 0.9
            }
        );
        assert_eq!(config.label(), "tiger");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.summary.ct_depth, 12);
        assert_eq!(snapshot.path.as_deref(), Some(path.display().to_string().as_str()));
    }

    #[test]
    fn test_load_json_experiment() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "rps.json", r#"{"environment":{"kind":"biased_rock_paper_scissors"}}"#);
        let config = load_config(&options(path)).unwrap();
        assert_eq!(config.experiment.environment.name(), "biased-rock-paper-scissors");
        assert!(config.raw.is_some());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(&options(PathBuf::from("/nonexistent/aixi/experiment.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.code(), 12);
    }

    #[test]
    fn test_parse_errors_name_the_format() {
        let dir = TempDir::new().unwrap();
        let toml_path = write(&dir, "bad.toml", "[agent\nct_depth = 3");
        assert!(matches!(
            load_config(&options(toml_path)).unwrap_err(),
            ConfigError::TomlParse { .. }
        ));

        let json_path = write(&dir, "bad.json", "{\"agent\": ");
        let err = load_config(&options(json_path)).unwrap_err();
        assert!(matches!(err, ConfigError::JsonParse { .. }));
        assert_eq!(err.code(), 13);
    }

    #[test]
    fn test_semantic_validation_applies() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "coin.toml",
            "[environment]\nkind = \"coin_flip\"\np = 1.5\n",
        );
        let err = load_config(&options(path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn test_version_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "old.toml", "schema_version = \"0.1.0\"\n");
        let err = load_config(&options(path)).unwrap_err();
        assert!(matches!(err, ConfigError::VersionMismatch { .. }));
    }

    #[test]
    fn test_preset_loading() {
        let config = load_config(&ConfigOptions {
            path: None,
            preset: Some("maze".to_string()),
        })
        .unwrap();
        assert_eq!(config.preset, Some(PresetName::CheeseMaze));
        assert_eq!(config.label(), "preset:cheese-maze");
        assert!(!config.is_default());

        let err = load_config(&ConfigOptions {
            path: None,
            preset: Some("pacman".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.code(), 14);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("experiment")), ConfigFormat::Toml);
    }
}
