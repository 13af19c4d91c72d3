//! Run configuration loaded from JSON.
//!
//! Kinetic parameter sets are fitted externally and passed in positionally;
//! this file only covers how a run is carried out (time window, retry ladder,
//! export).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::biochemistry::retry::{RetryPolicy, TimeWindow};

/// Top-level run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// t0 = 0, t_end = 3600 s, h = 1 s unless overridden
    pub window: TimeWindow,
    /// Refinements 0.1 s and 0.01 s, soft failure
    pub retry: RetryPolicy,
    pub export: ExportSettings,
}

impl SimulationConfig {
    /// Load from a JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded simulation config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse simulation config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Simulation config file not found, using defaults");
                Self::default()
            }
        }
    }
}

/// Where results are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("exports"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biochemistry::retry::FailurePolicy;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.window.t0_sec, 0.0);
        assert_eq!(config.window.t_end_sec, 3600.0);
        assert_eq!(config.window.step_size_sec, 1.0);
        assert_eq!(config.retry.refinements, vec![0.1, 0.01]);
        assert_eq!(config.retry.failure_policy, FailurePolicy::SoftFail);
        assert!(!config.retry.skip_negative_retry);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "retry": { "failure_policy": "Strict" } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.retry.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.retry.refinements, vec![0.1, 0.01]);
        assert_eq!(config.window, TimeWindow::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SimulationConfig::load_or_default("/nonexistent/cmybpc_config.json");
        assert_eq!(config, SimulationConfig::default());
    }
}
