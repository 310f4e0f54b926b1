//! Configuration snapshots for run provenance.
//!
//! A snapshot captures the exact experiment configuration a run started with,
//! so telemetry can be tied back to the file that produced it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::experiment::ExperimentConfig;
use crate::resolve::ResolvedPath;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the experiment was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Where the path came from.
    pub source: String,

    /// SHA-256 of the file content, or of the canonical JSON for defaults.
    pub content_hash: String,

    /// Key values for quick reference.
    pub summary: ConfigSummary,
}

/// Key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSummary {
    pub environment: String,
    pub actions: u64,
    pub observation_bits: u32,
    pub reward_bits: u32,
    pub horizon: u32,
    pub ct_depth: usize,
    pub exploration_rate: f64,
    pub total_cycles: u64,
    pub seed: Option<u64>,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded experiment.
    ///
    /// `raw` is the file content when one was read; built-in defaults are
    /// hashed through their JSON form instead.
    pub fn new(config: &ExperimentConfig, resolved: &ResolvedPath, raw: Option<&str>) -> Self {
        let content_hash = match raw {
            Some(text) => hash_content(text),
            None => hash_content(&serde_json::to_string(config).unwrap_or_default()),
        };

        let interface = config.environment.interface();
        let summary = ConfigSummary {
            environment: config.environment.name().to_string(),
            actions: config.agent.actions.unwrap_or(interface.actions),
            observation_bits: config
                .agent
                .observation_bits
                .unwrap_or(interface.observation_bits),
            reward_bits: config.agent.reward_bits.unwrap_or(interface.reward_bits),
            horizon: config.agent.horizon,
            ct_depth: config.agent.ct_depth,
            exploration_rate: config.exploration.rate,
            total_cycles: config.schedule.scaled_total(),
            seed: config.seed,
        };

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            source: resolved.source.to_string(),
            content_hash,
            summary,
        }
    }
}

/// Compute the SHA-256 hash of content as lowercase hex.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
