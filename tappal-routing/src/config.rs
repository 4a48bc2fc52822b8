//! Configuration for the routing core.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tappal_access::lifecycle::DEFAULT_MAX_REASON_LEN;
use tappal_access::TransitionPolicy;

/// Error types for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Configuration for the routing service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Status lifecycle rules
    pub lifecycle: LifecycleConfig,
    /// Ledger settings
    pub ledger: LedgerConfig,
    /// Comment settings
    pub comments: CommentConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl RoutingConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Load config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&yaml)?)
    }

    /// Transition policy derived from the lifecycle section.
    pub fn policy(&self) -> TransitionPolicy {
        TransitionPolicy {
            terminal_is_final: self.lifecycle.terminal_is_final,
            max_reason_len: self.lifecycle.max_reason_len,
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Forbid leaving Completed or Rejected
    pub terminal_is_final: bool,
    /// Maximum reason length for forwards and status changes (characters)
    pub max_reason_len: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            terminal_is_final: true,
            max_reason_len: DEFAULT_MAX_REASON_LEN,
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Verify the digest chain whenever a history is opened
    pub verify_on_read: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verify_on_read: true,
        }
    }
}

/// Comment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Maximum comment body length (characters)
    pub max_body_len: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self { max_body_len: 4000 }
    }
}

/// General configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert!(config.lifecycle.terminal_is_final);
        assert_eq!(config.lifecycle.max_reason_len, 2000);
        assert!(config.ledger.verify_on_read);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.policy(), TransitionPolicy::default());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = RoutingConfig::default();
        config.lifecycle.terminal_is_final = false;
        let yaml = config.to_yaml().unwrap();
        let parsed = RoutingConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.policy(), TransitionPolicy::permissive());
    }

    #[test]
    fn test_partial_yaml() {
        let config = RoutingConfig::from_yaml("comments:\n  max_body_len: 500\n").unwrap();
        assert_eq!(config.comments.max_body_len, 500);
        assert!(config.lifecycle.terminal_is_final);
    }
}
