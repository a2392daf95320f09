//! Analysis configuration
//!
//! Limits applied while parsing, exploring and rewriting queries. Values are loaded
//! from YAML and validated before use.
//!
//! ## Usage
//!
//! ```yaml
//! # analysis.yaml
//! max_subquery_depth: 16
//! max_expression_length: 65536
//! max_expression_depth: 64
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default bound on subquery nesting.
pub const DEFAULT_MAX_SUBQUERY_DEPTH: usize = 32;

/// Default bound on expression text length, in bytes.
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 1024 * 1024;

/// Default bound on expression nesting (parentheses, NOT, unary minus, operator chains).
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 128;

/// Limits for query analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Deepest allowed subquery nesting, in both the parser and the rewriter
    pub max_subquery_depth: usize,
    /// Longest accepted query expression, in bytes
    pub max_expression_length: usize,
    /// Deepest allowed expression nesting while parsing, counted across subqueries
    pub max_expression_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_subquery_depth: DEFAULT_MAX_SUBQUERY_DEPTH,
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

/// Errors that can occur while loading analysis configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {file}: {error}")]
    IoError {
        file: PathBuf,
        error: std::io::Error,
    },

    #[error("YAML parsing error in {source_name}: {error}")]
    ParseError {
        source_name: String,
        error: serde_yaml::Error,
    },

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl AnalysisConfig {
    /// Parse configuration from YAML text; absent keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig =
            serde_yaml::from_str(yaml).map_err(|error| ConfigError::ParseError {
                source_name: "<inline>".to_string(),
                error,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|error| ConfigError::IoError {
            file: path.to_path_buf(),
            error,
        })?;
        let config: AnalysisConfig =
            serde_yaml::from_str(&content).map_err(|error| ConfigError::ParseError {
                source_name: path.display().to_string(),
                error,
            })?;
        config.validate()?;
        log::debug!("Loaded analysis config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_subquery_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_subquery_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_expression_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_expression_length".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_expression_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_expression_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
