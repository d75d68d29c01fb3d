//! # dbmigrate-core
//!
//! File-based SQL schema migrations for SQLite, PostgreSQL and MySQL.
//!
//! Migrations are pairs of files in one directory:
//!
//! ```text
//! migrations/
//!   001_create_users.up.sql
//!   001_create_users.down.sql
//!   002_add_email_index.up.sql
//! ```
//!
//! Applied migrations are recorded in a `schema_migrations` table inside the
//! target database together with a checksum of the up-script, so edits made
//! after a migration ran are reported as drift.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dbmigrate_core::{MigrationEngine, Settings};
//!
//! # fn main() -> dbmigrate_core::Result<()> {
//! let settings = Settings::builder()
//!     .sqlite("app.db")
//!     .migrations_dir("./migrations")
//!     .build();
//! let engine = MigrationEngine::from_settings(&settings);
//!
//! engine.create("create users", "CREATE TABLE users (id INTEGER PRIMARY KEY);", Some("DROP TABLE users;"))?;
//! let batch = engine.apply_all_pending(false)?;
//! println!("applied {} of {}", batch.applied, batch.total);
//! # Ok(())
//! # }
//! ```
//!
//! All operations are synchronous and open a fresh connection per call.

pub mod adapter;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod splitter;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapter::{Backend, Connection, DatabaseAdapter, SqlParam};
pub use config::{ConfigError, DatabaseConfig, ServerConfig, Settings, SettingsBuilder};
pub use engine::MigrationEngine;
pub use error::{ErrorKind, Failure, MigrateError, Result};
pub use types::{
    AppliedRecord, BatchReport, ColumnInfo, CreatedMigration, Direction, Drift, DriftReport,
    Flagged, IndexInfo, MigrationFile, MigrationReport, MigrationStatus, QueryOutcome,
    QueryResult, StepOutcome, TableDetail, TableSummary,
};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::{
        Backend, DatabaseAdapter, Direction, MigrateError, MigrationEngine, Result, Settings,
    };
}
