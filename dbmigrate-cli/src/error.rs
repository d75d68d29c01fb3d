//! CLI-specific error types

use dbmigrate_core::ConfigError;
use dbmigrate_tools::ToolError;
use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool dispatch failed before producing a result
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// `--input` was not valid JSON
    #[error("Invalid --input JSON: {0}")]
    InputJson(serde_json::Error),

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (stdin, stdout)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
