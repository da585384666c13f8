//! Bridge configuration

use super::synth::{DEFAULT_PROGRAM_MARGIN, Interpolation};
use crate::engine::EngineLimits;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a [`Bridge`](super::Bridge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How the expression and JSON reach the engine (default: escaped)
    pub interpolation: Interpolation,

    /// Slack added to the interpolated lengths when sizing the program buffer
    pub program_margin: usize,

    /// Decode the embedded library once and reuse it across calls
    pub cache_library: bool,

    /// Limits applied to each interpreter heap
    pub limits: EngineLimits,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            program_margin: DEFAULT_PROGRAM_MARGIN,
            cache_library: false,
            limits: EngineLimits::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: BridgeConfig =
            serde_json::from_slice(&data).context("Failed to deserialize config")?;
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }
}
