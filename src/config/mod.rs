use crate::reconcile::UpdatePolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete pushsource configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushSourceConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Where streamer configuration comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON file, optionally hot-reloaded
    #[default]
    Json,
    /// Records embedded in this config file
    Inline,
}

/// Data source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default = "default_auto_reload")]
    pub auto_reload: bool,
    #[serde(default = "default_reload_interval")]
    pub reload_interval_seconds: u64,
    #[serde(default)]
    pub update_policy: UpdatePolicy,
    /// Streamer records for `kind = "inline"`
    #[serde(default)]
    pub records: Vec<Value>,
}

fn default_path() -> PathBuf {
    PathBuf::from("streamers.json")
}

fn default_auto_reload() -> bool {
    true
}

fn default_reload_interval() -> u64 {
    5
}

impl SourceConfig {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_seconds.max(1))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: default_path(),
            auto_reload: default_auto_reload(),
            reload_interval_seconds: default_reload_interval(),
            update_policy: UpdatePolicy::default(),
            records: Vec::new(),
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Buffered notifications per subscriber before it starts lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<PushSourceConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: PushSourceConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
