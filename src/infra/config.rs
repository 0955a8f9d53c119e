//! Configuration loading from TOML files
//!
//! The binary picks the file path (`--config`, then `CONFIG_FILE`, then
//! `config/dev.toml`); this module only reads and validates it.

use crate::domain::types::RouterType;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Slack around [0, 100] that is clamped instead of rejected
    #[serde(default = "default_completion_tolerance_pct")]
    pub completion_tolerance_pct: f64,
}

fn default_completion_tolerance_pct() -> f64 {
    0.5
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { completion_tolerance_pct: default_completion_tolerance_pct() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlanningConfig {
    /// Router selected when a new planning session starts
    #[serde(default)]
    pub default_router: RouterType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the navigator event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Seconds between metrics summaries (0 to disable)
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_event_buffer() -> usize {
    256
}

fn default_metrics_interval_secs() -> u64 {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            metrics_interval_secs: default_metrics_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// JSONL feed of engine and UI events
    #[serde(default = "default_replay_file")]
    pub file: String,
    /// Delay between feed lines in milliseconds
    #[serde(default)]
    pub pace_ms: u64,
}

fn default_replay_file() -> String {
    "feeds/demo.jsonl".to_string()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { file: default_replay_file(), pace_ms: 0 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    completion_tolerance_pct: f64,
    default_router: RouterType,
    event_buffer: usize,
    metrics_interval_secs: u64,
    replay_file: String,
    replay_pace_ms: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            completion_tolerance_pct: 0.5,
            default_router: RouterType::Vehicle,
            event_buffer: 256,
            metrics_interval_secs: 10,
            replay_file: "feeds/demo.jsonl".to_string(),
            replay_pace_ms: 0,
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, source: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", source))?;

        let completion_tolerance_pct = toml_config.snapshot.completion_tolerance_pct;
        if !completion_tolerance_pct.is_finite() || completion_tolerance_pct < 0.0 {
            anyhow::bail!(
                "completion_tolerance_pct must be a non-negative number in {}, got {}",
                source,
                completion_tolerance_pct
            );
        }
        if toml_config.runtime.event_buffer == 0 {
            anyhow::bail!("event_buffer must be greater than zero in {}", source);
        }

        Ok(Self {
            completion_tolerance_pct,
            default_router: toml_config.planning.default_router,
            event_buffer: toml_config.runtime.event_buffer,
            metrics_interval_secs: toml_config.runtime.metrics_interval_secs,
            replay_file: toml_config.replay.file,
            replay_pace_ms: toml_config.replay.pace_ms,
            config_file: source.to_string(),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn completion_tolerance_pct(&self) -> f64 {
        self.completion_tolerance_pct
    }

    pub fn default_router(&self) -> RouterType {
        self.default_router
    }

    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn replay_file(&self) -> &str {
        &self.replay_file
    }

    pub fn replay_pace_ms(&self) -> u64 {
        self.replay_pace_ms
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the replay feed (command line takes precedence over the file)
    pub fn with_replay_file(mut self, file: &str) -> Self {
        self.replay_file = file.to_string();
        self
    }

    /// Builder method for tests to set the completion tolerance
    #[cfg(test)]
    pub fn with_completion_tolerance_pct(mut self, pct: f64) -> Self {
        self.completion_tolerance_pct = pct;
        self
    }
}
