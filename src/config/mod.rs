//! Engine configuration
//!
//! Settings that change how steps are parsed and how the crate logs. Hosts
//! usually embed these in their own configuration file; both YAML and TOML
//! are accepted.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How contradictory modifier ordering hints are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Resolve cycles by traversal order without reporting them
    #[default]
    Lenient,
    /// Reject steps whose modifiers' hints form a cycle
    Strict,
}

/// Parser and logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cycle handling of the modifier orderer
    pub ordering: OrderingPolicy,
    /// Verbosity level for logging
    pub verbose: u8,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ordering policy
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Set the verbosity level
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML engine configuration")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML engine configuration")
    }

    /// Load the configuration from a file, picking the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => {
                return Err(anyhow!(
                    "Unsupported configuration format: {}",
                    path.display()
                ))
            }
        };

        config.with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Get the log filter based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
