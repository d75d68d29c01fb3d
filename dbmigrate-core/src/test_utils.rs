//! Test utilities
//!
//! Each [`TestProject`] owns a temporary directory holding a SQLite database
//! and a migrations directory, so tests can run in parallel without sharing
//! state.
//!
//! # Example
//!
//! ```ignore
//! use dbmigrate_core::test_utils::TestProject;
//!
//! #[test]
//! fn test_something() {
//!     let project = TestProject::new();
//!     project.write_migration("001_users", "CREATE TABLE users (id INTEGER);", None);
//!
//!     project.engine().apply("001", false).unwrap();
//!     assert!(project.table_exists("users"));
//! }
//! ```

use crate::adapter::{DatabaseAdapter, SqliteAdapter};
use crate::engine::MigrationEngine;
use crate::types::{DOWN_SUFFIX, UP_SUFFIX};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A migrations directory and SQLite database removed when dropped.
pub struct TestProject {
    #[allow(dead_code)]
    temp_dir: TempDir,
    db_path: PathBuf,
    migrations_dir: PathBuf,
    engine: MigrationEngine,
}

impl TestProject {
    /// Creates an empty project. The migrations directory does not exist yet.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let migrations_dir = temp_dir.path().join("migrations");
        let engine = MigrationEngine::new(
            DatabaseAdapter::Sqlite(SqliteAdapter::new(&db_path)),
            &migrations_dir,
        );

        Self {
            temp_dir,
            db_path,
            migrations_dir,
            engine,
        }
    }

    pub fn engine(&self) -> &MigrationEngine {
        &self.engine
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Writes `{full_version}.up.sql` and, if given, `{full_version}.down.sql`.
    ///
    /// Existing files are overwritten, which is how tests simulate edits.
    pub fn write_migration(&self, full_version: &str, up_sql: &str, down_sql: Option<&str>) {
        std::fs::create_dir_all(&self.migrations_dir).expect("Failed to create migrations dir");
        std::fs::write(self.up_path(full_version), up_sql).expect("Failed to write up-script");
        if let Some(down_sql) = down_sql {
            std::fs::write(self.down_path(full_version), down_sql)
                .expect("Failed to write down-script");
        }
    }

    pub fn up_path(&self, full_version: &str) -> PathBuf {
        self.migrations_dir.join(format!("{full_version}{UP_SUFFIX}"))
    }

    pub fn down_path(&self, full_version: &str) -> PathBuf {
        self.migrations_dir
            .join(format!("{full_version}{DOWN_SUFFIX}"))
    }

    /// Opens a direct connection to the project database.
    pub fn connection(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.db_path).expect("Failed to open test database")
    }

    /// Executes SQL directly, bypassing the engine.
    pub fn execute(&self, sql: &str) {
        self.connection()
            .execute_batch(sql)
            .expect("Failed to execute SQL");
    }

    /// Returns `SELECT COUNT(*)` of `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                row.get(0)
            })
            .expect("Failed to count rows")
    }

    pub fn table_exists(&self, table: &str) -> bool {
        let count: i64 = self
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .expect("Failed to query sqlite_master");
        count > 0
    }

    /// Ledger versions, in version order.
    pub fn ledger_versions(&self) -> Vec<String> {
        self.engine
            .applied()
            .expect("Failed to read ledger")
            .into_iter()
            .map(|r| r.version)
            .collect()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
