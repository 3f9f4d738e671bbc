use markup::{DiffOptions, ParseOptions};
use runtime_patch::DEFAULT_DIAGNOSTICS_CAPACITY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid reconciler config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub parse: ParseOptions,
    pub diff: DiffOptions,
    /// Reclaim the registry every this many reconciles, when the applier is
    /// idle. Zero turns periodic reclaim off.
    pub reclaim_interval: u32,
    /// Skipped-edit warnings kept by the applier.
    pub diagnostics_capacity: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            diff: DiffOptions::default(),
            reclaim_interval: 32,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl ReconcilerConfig {
    /// Reads a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}
