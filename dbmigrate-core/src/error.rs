//! Error types for migration operations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, applying or rolling back migrations
#[derive(Debug, Error)]
pub enum MigrateError {
    /// No migration file with this version exists on disk
    #[error("Migration {0} not found")]
    NotFound(String),

    #[error("Migration {0} already applied")]
    AlreadyApplied(String),

    #[error("Migration {0} is not applied")]
    NotApplied(String),

    /// The migration exists but has no `.down.sql` companion
    #[error("Rollback file not found: {}", .path.display())]
    RollbackFileMissing { version: String, path: PathBuf },

    #[error("No migrations to rollback")]
    NothingToRollback,

    /// Table requested for inspection does not exist
    #[error("Table {0} not found")]
    TableNotFound(String),

    /// Two up-scripts claim the same version
    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    /// A migration name that cannot be turned into a file name
    #[error("Invalid migration name: {0:?}")]
    InvalidName(String),

    /// The highest numeric version has no successor
    #[error("No version follows {0}")]
    VersionExhausted(String),

    /// Read-only query guard rejected the statement
    #[error(
        "Safety block: '{0}' statements not allowed. Use migrations for schema changes."
    )]
    SafetyBlocked(&'static str),

    /// Failure while executing a specific migration
    #[error("{message}")]
    ExecutionFailure { version: String, message: String },

    /// A driver returned a value the ledger could not interpret
    #[error("Unexpected value in column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The SQL tokenizer could not make sense of a script
    #[error("SQL tokenizer error: {0}")]
    Tokenize(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    #[error(transparent)]
    Mysql(#[from] mysql::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stable classification of a [`MigrateError`], reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyApplied,
    NotApplied,
    RollbackFileMissing,
    NothingToRollback,
    ExecutionFailure,
    SafetyBlocked,
    DuplicateVersion,
    InvalidName,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::NotFound(_) | MigrateError::TableNotFound(_) => ErrorKind::NotFound,
            MigrateError::AlreadyApplied(_) => ErrorKind::AlreadyApplied,
            MigrateError::NotApplied(_) => ErrorKind::NotApplied,
            MigrateError::RollbackFileMissing { .. } => ErrorKind::RollbackFileMissing,
            MigrateError::NothingToRollback => ErrorKind::NothingToRollback,
            MigrateError::SafetyBlocked(_) => ErrorKind::SafetyBlocked,
            MigrateError::DuplicateVersion { .. } => ErrorKind::DuplicateVersion,
            MigrateError::InvalidName(_) | MigrateError::VersionExhausted(_) => {
                ErrorKind::InvalidName
            }
            MigrateError::ExecutionFailure { .. }
            | MigrateError::Decode { .. }
            | MigrateError::Tokenize(_)
            | MigrateError::Sqlite(_)
            | MigrateError::Postgres(_)
            | MigrateError::Mysql(_)
            | MigrateError::Io(_) => ErrorKind::ExecutionFailure,
        }
    }

    /// The migration version this error concerns, if any
    pub fn version(&self) -> Option<&str> {
        match self {
            MigrateError::NotFound(v)
            | MigrateError::AlreadyApplied(v)
            | MigrateError::NotApplied(v) => Some(v),
            MigrateError::RollbackFileMissing { version, .. }
            | MigrateError::ExecutionFailure { version, .. }
            | MigrateError::DuplicateVersion { version, .. } => Some(version),
            _ => None,
        }
    }

    /// Attach a version to infrastructure errors raised while running it.
    ///
    /// Domain errors already know their version and pass through untouched.
    pub fn during(self, version: &str) -> Self {
        match self.kind() {
            ErrorKind::ExecutionFailure if self.version().is_none() => {
                MigrateError::ExecutionFailure {
                    version: version.to_string(),
                    message: self.to_string(),
                }
            }
            _ => self,
        }
    }
}

/// Failure half of an operation result as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub error: String,
}

impl From<&MigrateError> for Failure {
    fn from(err: &MigrateError) -> Self {
        Failure {
            kind: err.kind(),
            version: err.version().map(str::to_string),
            error: err.to_string(),
        }
    }
}

impl From<MigrateError> for Failure {
    fn from(err: MigrateError) -> Self {
        Failure::from(&err)
    }
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
