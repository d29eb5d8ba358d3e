//! Session configuration (`meml.toml`)

use crate::vm::DEFAULT_MAX_CALL_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A setting is out of range
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Settings of one [`Session`](crate::session::Session).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Load the core prelude before any user source
    pub prelude: bool,

    /// Call depth limit of the evaluator
    pub max_call_depth: usize,

    /// Nesting limit of the parser
    pub max_parse_depth: usize,

    /// Emit a `trace` event per typing judgement
    pub trace_typing: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prelude: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_parse_depth: 256,
            trace_typing: false,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if self.max_parse_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_parse_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
