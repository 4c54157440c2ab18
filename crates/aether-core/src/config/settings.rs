use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cost::{CostModel, DEFAULT_RATE_PER_TOKEN};
use crate::error::CoreError;

const CONFIG_FILE: &str = "config.json";

/// Maximum number of audit log entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful multi-agent coordinator.";
pub const DEFAULT_MODEL: &str = "phi3.5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    pub rate_per_token: f64,
    pub log_capacity: usize,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,
    pub cache_enabled: bool,
}

impl Default for AetherConfig {
    fn default() -> Self {
        Self {
            rate_per_token: DEFAULT_RATE_PER_TOKEN,
            log_capacity: DEFAULT_LOG_CAPACITY,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.6,
            max_tokens: 256,
            model: DEFAULT_MODEL.to_string(),
            engine_url: None,
            cache_enabled: true,
        }
    }
}

impl AetherConfig {
    fn config_path(home: &Path) -> PathBuf {
        home.join(CONFIG_FILE)
    }

    /// Read `config.json` from the home directory. Missing file means defaults.
    pub fn load(home: &Path) -> Result<Self, CoreError> {
        let path = Self::config_path(home);
        let config = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(CoreError::Io(e)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Write `config.json` into the home directory, creating it if needed.
    pub fn save(&self, home: &Path) -> Result<(), CoreError> {
        self.validate()?;
        fs::create_dir_all(home)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(Self::config_path(home), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.rate_per_token.is_finite() || self.rate_per_token < 0.0 {
            return Err(CoreError::Config(format!(
                "rate_per_token must be a finite non-negative number, got {}",
                self.rate_per_token
            )));
        }
        if self.log_capacity == 0 {
            return Err(CoreError::Config("log_capacity must be at least 1".into()));
        }
        if self.model.trim().is_empty() {
            return Err(CoreError::Config("model must not be empty".into()));
        }
        Ok(())
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.rate_per_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AetherConfig::load(tmp.path()).unwrap();
        assert_eq!(config, AetherConfig::default());
        assert_eq!(config.log_capacity, 500);
        assert_eq!(config.max_tokens, 256);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("nested");
        let config = AetherConfig {
            engine_url: Some("http://localhost:11434".into()),
            log_capacity: 10,
            ..Default::default()
        };
        config.save(&home).unwrap();
        assert_eq!(AetherConfig::load(&home).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), r#"{"model":"gemma2:2b"}"#).unwrap();
        let config = AetherConfig::load(tmp.path()).unwrap();
        assert_eq!(config.model, "gemma2:2b");
        assert_eq!(config.rate_per_token, DEFAULT_RATE_PER_TOKEN);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_rate = AetherConfig {
            rate_per_token: -0.1,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());

        let zero_cap = AetherConfig {
            log_capacity: 0,
            ..Default::default()
        };
        assert!(zero_cap.validate().is_err());
    }
}
