//! Simulation Settings

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Default ceiling on the switch count (2^20 trials).
pub const DEFAULT_MAX_SWITCHES: usize = 20;

/// What to do with a connection that names an unknown node or port.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPolicy {
    /// Fail the run with a configuration error.
    #[default]
    Reject,
    /// Skip the connection and log a warning.
    Ignore,
}

/// Settings for a simulation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_switches: usize,
    pub unknown_connections: ConnectionPolicy,
    pub parallel: bool,
    /// Keep the hop list of each discarded trial's failing trace and log it
    /// at debug level.
    pub record_hops: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_switches: DEFAULT_MAX_SWITCHES,
            unknown_connections: ConnectionPolicy::Reject,
            parallel: false,
            record_hops: false,
        }
    }
}

impl SimulationConfig {
    /// Save settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");

        let cfg = SimulationConfig {
            max_switches: 8,
            unknown_connections: ConnectionPolicy::Ignore,
            parallel: true,
            record_hops: true,
        };
        cfg.save(&path).unwrap();

        let loaded = SimulationConfig::load(&path).unwrap();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: SimulationConfig = serde_json::from_str(r#"{"parallel": true}"#).unwrap();
        assert!(cfg.parallel);
        assert_eq!(cfg.max_switches, DEFAULT_MAX_SWITCHES);
        assert_eq!(cfg.unknown_connections, ConnectionPolicy::Reject);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SimulationConfig::load(dir.path().join("absent.json")).is_err());
    }
}
