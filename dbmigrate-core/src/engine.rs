//! Migration orchestration
//!
//! The engine owns the adapter and the migrations directory. Every call
//! rescans the directory and rereads the ledger, so sequential calls always
//! see each other's effects. Nothing is cached between calls.
//!
//! Two processes applying the same version concurrently are not serialized;
//! the loser fails on the ledger's primary key and reports an execution
//! failure. Callers that need mutual exclusion must take an external lock.

use crate::adapter::{Backend, Connection, DatabaseAdapter};
use crate::config::Settings;
use crate::discovery::{self, next_version, sanitize_name};
use crate::error::{Failure, MigrateError, Result};
use crate::guard::ensure_read_only;
use crate::ledger;
use crate::splitter::{find_transaction_control, split_statements};
use crate::types::{
    AppliedRecord, BatchReport, CreatedMigration, Direction, Drift, DriftReport, MigrationFile,
    MigrationReport, MigrationStatus, QueryOutcome, StepOutcome, TableDetail, TableSummary,
    DOWN_SUFFIX, UP_SUFFIX,
};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Characters of a script shown in a dry-run preview
pub const PREVIEW_CHARS: usize = 500;

pub const NO_RESULTS_MESSAGE: &str = "Query executed, no results returned";
pub const NO_TABLES_MESSAGE: &str = "(No tables found)";

#[derive(Debug, Clone)]
pub struct MigrationEngine {
    adapter: DatabaseAdapter,
    migrations_dir: PathBuf,
}

impl MigrationEngine {
    pub fn new(adapter: DatabaseAdapter, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            adapter,
            migrations_dir: migrations_dir.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            DatabaseAdapter::from_config(&settings.database),
            settings.migrations_dir.clone(),
        )
    }

    pub fn adapter(&self) -> &DatabaseAdapter {
        &self.adapter
    }

    pub fn backend(&self) -> Backend {
        self.adapter.backend()
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// The catalog as it is on disk right now
    pub fn available(&self) -> Result<Vec<MigrationFile>> {
        discovery::scan(&self.migrations_dir)
    }

    /// Ledger rows, ordered by version
    pub fn applied(&self) -> Result<Vec<AppliedRecord>> {
        let mut conn = self.open_ledger()?;
        ledger::applied(&mut conn)
    }

    pub fn status(&self) -> Result<MigrationStatus> {
        let catalog = self.available()?;
        let records = self.applied()?;
        Ok(partition(catalog, &records))
    }

    pub fn pending(&self) -> Result<Vec<MigrationFile>> {
        Ok(self.status()?.pending)
    }

    pub fn check_drift(&self) -> Result<DriftReport> {
        let status = self.status()?;
        for drift in &status.drift_detected {
            warn!(
                version = %drift.version,
                expected = %drift.expected,
                actual = %drift.actual,
                "migration modified after being applied"
            );
        }
        Ok(DriftReport::new(status.drift_detected))
    }

    /// Look up a migration by version or full version.
    pub fn find(&self, id: &str) -> Result<MigrationFile> {
        let catalog = self.available()?;
        find_in(catalog, id)
    }

    /// Raw text of one of a migration's scripts.
    pub fn read_sql(&self, id: &str, direction: Direction) -> Result<String> {
        let migration = self.find(id)?;
        let path = migration.script_path(direction);
        if direction == Direction::Down && !path.is_file() {
            return Err(MigrateError::RollbackFileMissing {
                version: migration.version,
                path,
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Apply one migration.
    ///
    /// On SQLite and PostgreSQL the script and its ledger row commit together.
    pub fn apply(&self, version: &str, dry_run: bool) -> Result<MigrationReport> {
        let migration = self.find(version)?;
        let mut conn = self.open_ledger()?;
        let records = ledger::applied(&mut conn)?;
        if records.iter().any(|r| r.version == migration.version) {
            return Err(MigrateError::AlreadyApplied(migration.version));
        }
        self.apply_file(&mut conn, &migration, dry_run)
    }

    /// Roll back one migration with its down-script.
    pub fn rollback(&self, version: &str, dry_run: bool) -> Result<MigrationReport> {
        let migration = self.find(version)?;
        let down_path = migration.down_path();
        if !down_path.is_file() {
            return Err(MigrateError::RollbackFileMissing {
                version: migration.version,
                path: down_path,
            });
        }

        let mut conn = self.open_ledger()?;
        let records = ledger::applied(&mut conn)?;
        if !records.iter().any(|r| r.version == migration.version) {
            return Err(MigrateError::NotApplied(migration.version));
        }

        let sql = fs::read_to_string(&down_path)
            .map_err(|e| MigrateError::from(e).during(&migration.version))?;
        self.reject_transaction_control(&migration, &sql)?;
        if dry_run {
            return Ok(preview(&migration, Direction::Down, &sql, self.backend()));
        }

        let started = Instant::now();
        let result = conn.transaction(|conn| {
            conn.execute_script(&sql)?;
            ledger::remove(conn, &migration.version)?;
            Ok(elapsed_ms(started))
        });

        match result {
            Ok(elapsed) => {
                info!(version = %migration.version, elapsed_ms = elapsed, "rolled back migration");
                Ok(report(&migration, Direction::Down, Some(elapsed)))
            }
            Err(err) => {
                let err = err.during(&migration.version);
                error!(version = %migration.version, error = %err, "rollback failed");
                Err(err)
            }
        }
    }

    /// Apply every pending migration in version order.
    ///
    /// A real run stops at the first failure; earlier migrations stay applied.
    /// A dry run previews every pending migration.
    pub fn apply_all_pending(&self, dry_run: bool) -> Result<BatchReport> {
        let catalog = self.available()?;
        let mut conn = self.open_ledger()?;
        let records = ledger::applied(&mut conn)?;
        let pending = partition(catalog, &records).pending;

        let total = pending.len();
        let mut results = Vec::with_capacity(total);
        for migration in &pending {
            match self.apply_file(&mut conn, migration, dry_run) {
                Ok(report) => results.push(StepOutcome::Succeeded(report)),
                Err(err) => {
                    results.push(StepOutcome::Failed(Failure::from(&err)));
                    if !dry_run {
                        warn!(version = %migration.version, "stopping batch after failure");
                        break;
                    }
                }
            }
        }

        let applied = results.iter().filter(|r| r.is_success()).count();
        info!(total, applied, dry_run, "batch finished");
        Ok(BatchReport {
            total,
            attempted: results.len(),
            applied,
            dry_run,
            results,
        })
    }

    /// Roll back the highest applied version.
    pub fn rollback_last(&self) -> Result<MigrationReport> {
        let status = self.status()?;
        let last = status
            .applied
            .last()
            .ok_or(MigrateError::NothingToRollback)?;
        self.rollback(&last.version, false)
    }

    /// Write a new migration pair to the migrations directory.
    ///
    /// Never touches the database. Existing files are never overwritten.
    pub fn create(
        &self,
        name: &str,
        up_sql: &str,
        down_sql: Option<&str>,
    ) -> Result<CreatedMigration> {
        let safe_name = sanitize_name(name)?;
        let version = next_version(&self.available()?)?;
        let full_version = format!("{version}_{safe_name}");
        let created = Utc::now().to_rfc3339();

        fs::create_dir_all(&self.migrations_dir)?;

        let up_file = self.migrations_dir.join(format!("{full_version}{UP_SUFFIX}"));
        write_new(
            &up_file,
            &format!(
                "-- Migration: {full_version}\n-- Created: {created}\n-- Description: {name}\n\n{up_sql}\n"
            ),
        )?;

        let down_file = match down_sql.filter(|sql| !sql.trim().is_empty()) {
            Some(down_sql) => {
                let path = self
                    .migrations_dir
                    .join(format!("{full_version}{DOWN_SUFFIX}"));
                let content =
                    format!("-- Rollback: {full_version}\n-- Created: {created}\n\n{down_sql}\n");
                if let Err(err) = write_new(&path, &content) {
                    if let Err(cleanup) = fs::remove_file(&up_file) {
                        warn!(path = %up_file.display(), error = %cleanup, "could not remove up-script");
                    }
                    return Err(err);
                }
                Some(path)
            }
            None => None,
        };

        info!(version = %version, name = %safe_name, "created migration");
        Ok(CreatedMigration {
            version,
            name: safe_name,
            up_file,
            down_file,
        })
    }

    /// Run an inspection query. Anything mentioning a write keyword is refused.
    pub fn run_query(&self, sql: &str) -> Result<QueryOutcome> {
        if let Err(err) = ensure_read_only(sql) {
            warn!(error = %err, "blocked query");
            return Err(err);
        }
        debug!(sql = %truncate(sql, 100), "running query");

        let mut conn = self.adapter.connect()?;
        Ok(match conn.query(sql)? {
            Some(rows) => QueryOutcome::Rows(rows),
            None => QueryOutcome::NoResults {
                message: NO_RESULTS_MESSAGE.to_string(),
            },
        })
    }

    pub fn test_connection(&self) -> Result<()> {
        self.adapter.test_connection()?;
        info!(backend = %self.backend(), "connection test succeeded");
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<TableSummary>> {
        self.adapter.list_tables()
    }

    pub fn inspect_table(&self, table: &str) -> Result<TableDetail> {
        self.adapter.inspect_table(table)
    }

    /// Schema DDL, or a placeholder line for an empty database
    pub fn schema_text(&self) -> Result<String> {
        let schema = self.adapter.get_schema()?;
        if schema.trim().is_empty() {
            Ok(NO_TABLES_MESSAGE.to_string())
        } else {
            Ok(schema)
        }
    }

    /// Plain-text status report.
    pub fn status_summary(&self) -> Result<String> {
        Ok(render_status(self.backend(), &self.status()?))
    }

    /// Prompt text asking for an explanation of a migration.
    ///
    /// Unknown versions produce a short "not found" prompt instead of an error.
    pub fn explain(&self, id: &str) -> Result<String> {
        let migration = match self.find(id) {
            Ok(migration) => migration,
            Err(MigrateError::NotFound(_)) => {
                return Ok(format!(
                    "Migration {id} not found. Please check the version number."
                ))
            }
            Err(err) => return Err(err),
        };

        let up_sql = fs::read_to_string(migration.up_path()).unwrap_or_else(|err| {
            warn!(version = %migration.version, error = %err, "could not read up-script");
            "(Error reading UP migration file)".to_string()
        });
        let down_path = migration.down_path();
        let down_sql = if down_path.is_file() {
            fs::read_to_string(&down_path).unwrap_or_else(|err| {
                warn!(version = %migration.version, error = %err, "could not read down-script");
                "(Error reading DOWN migration file)".to_string()
            })
        } else {
            String::new()
        };

        let record = self
            .applied()?
            .into_iter()
            .find(|r| r.version == migration.version);

        Ok(render_explanation(&migration, record.as_ref(), &up_sql, &down_sql))
    }

    /// Connection with the ledger table in place
    fn open_ledger(&self) -> Result<Connection> {
        let mut conn = self.adapter.connect()?;
        ledger::ensure_table(&mut conn)?;
        Ok(conn)
    }

    /// Scripts run inside a transaction the engine opens and commits, so they
    /// must not open or end one themselves.
    fn reject_transaction_control(&self, migration: &MigrationFile, sql: &str) -> Result<()> {
        let found = find_transaction_control(sql, self.backend())
            .map_err(|e| e.during(&migration.version))?;
        match found {
            Some(keyword) => {
                warn!(version = %migration.version, %keyword, "script contains transaction control");
                Err(MigrateError::ExecutionFailure {
                    version: migration.version.clone(),
                    message: format!(
                        "{keyword} is not allowed in migration scripts; each script already runs in its own transaction"
                    ),
                })
            }
            None => Ok(()),
        }
    }

    fn apply_file(
        &self,
        conn: &mut Connection,
        migration: &MigrationFile,
        dry_run: bool,
    ) -> Result<MigrationReport> {
        let sql = fs::read_to_string(migration.up_path())
            .map_err(|e| MigrateError::from(e).during(&migration.version))?;
        self.reject_transaction_control(migration, &sql)?;
        if dry_run {
            return Ok(preview(migration, Direction::Up, &sql, self.backend()));
        }

        let started = Instant::now();
        let result = conn.transaction(|conn| {
            conn.execute_script(&sql)?;
            let elapsed = elapsed_ms(started);
            ledger::record(conn, migration, elapsed)?;
            Ok(elapsed)
        });

        match result {
            Ok(elapsed) => {
                info!(version = %migration.version, elapsed_ms = elapsed, "applied migration");
                Ok(report(migration, Direction::Up, Some(elapsed)))
            }
            Err(err) => {
                let err = err.during(&migration.version);
                error!(version = %migration.version, error = %err, "migration failed");
                Err(err)
            }
        }
    }
}

/// Split the catalog by ledger membership and compare checksums.
pub fn partition(catalog: Vec<MigrationFile>, records: &[AppliedRecord]) -> MigrationStatus {
    let by_version: HashMap<&str, &AppliedRecord> =
        records.iter().map(|r| (r.version.as_str(), r)).collect();

    let mut status = MigrationStatus {
        current_version: records.last().map(|r| r.version.clone()),
        missing: records
            .iter()
            .filter(|r| !catalog.iter().any(|m| m.version == r.version))
            .map(|r| r.version.clone())
            .collect(),
        ..MigrationStatus::default()
    };

    for migration in catalog {
        match by_version.get(migration.version.as_str()) {
            Some(record) => {
                if record.checksum != migration.checksum {
                    status.drift_detected.push(Drift {
                        version: migration.version.clone(),
                        expected: record.checksum.clone(),
                        actual: migration.checksum.clone(),
                    });
                }
                status.applied.push(migration);
            }
            None => status.pending.push(migration),
        }
    }

    status
}

fn find_in(catalog: Vec<MigrationFile>, id: &str) -> Result<MigrationFile> {
    catalog
        .into_iter()
        .find(|m| m.matches(id))
        .ok_or_else(|| MigrateError::NotFound(id.to_string()))
}

fn report(migration: &MigrationFile, direction: Direction, elapsed: Option<i64>) -> MigrationReport {
    MigrationReport {
        version: migration.version.clone(),
        name: migration.name.clone(),
        direction,
        dry_run: false,
        execution_time_ms: elapsed,
        sql_preview: None,
        statement_count: None,
        message: None,
    }
}

fn preview(
    migration: &MigrationFile,
    direction: Direction,
    sql: &str,
    backend: Backend,
) -> MigrationReport {
    debug!(version = %migration.version, %direction, "dry run");
    MigrationReport {
        dry_run: true,
        sql_preview: Some(truncate(sql, PREVIEW_CHARS)),
        statement_count: split_statements(sql, backend).ok().map(|s| s.len()),
        message: Some(format!(
            "Dry run: {} {} not executed",
            migration.full_version, direction
        )),
        ..report(migration, direction, None)
    }
}

/// First `max` characters of `text`, with "..." appended when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn bullet_list(items: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = items.map(|item| format!("  - {item}")).collect();
    if lines.is_empty() {
        "  (none)".to_string()
    } else {
        lines.join("\n")
    }
}

fn render_status(backend: Backend, status: &MigrationStatus) -> String {
    let mut out = format!(
        "DATABASE MIGRATION STATUS\n\
         ========================\n\
         Database Type: {backend}\n\
         Current Version: {}\n\
         Applied: {}\n\
         Pending: {}\n\
         Drift Detected: {}\n\
         \n\
         PENDING MIGRATIONS:\n{}\n\
         \n\
         APPLIED MIGRATIONS:\n{}\n",
        status.current_version.as_deref().unwrap_or("(none)"),
        status.applied.len(),
        status.pending.len(),
        status.drift_detected.len(),
        bullet_list(status.pending.iter().map(|m| m.full_version.clone())),
        bullet_list(status.applied.iter().map(|m| m.full_version.clone())),
    );

    if status.has_drift() {
        let _ = write!(
            out,
            "\nDRIFT DETECTED:\n{}\n",
            bullet_list(
                status
                    .drift_detected
                    .iter()
                    .map(|d| format!("{}: checksum mismatch", d.version))
            )
        );
    }
    if !status.missing.is_empty() {
        let _ = write!(
            out,
            "\nMISSING FILES:\n{}\n",
            bullet_list(status.missing.iter().cloned())
        );
    }
    out
}

fn render_explanation(
    migration: &MigrationFile,
    record: Option<&AppliedRecord>,
    up_sql: &str,
    down_sql: &str,
) -> String {
    let status = match record {
        Some(record) => format!(
            "Status: Applied\nApplied At: {}\nExecution Time: {}ms",
            record.applied_at.to_rfc3339(),
            record
                .execution_time_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "?".to_string()),
        ),
        None => "Status: Pending (not yet applied)".to_string(),
    };
    let down_sql = if down_sql.is_empty() {
        "(No rollback script provided)"
    } else {
        down_sql
    };

    format!(
        "Please explain this database migration in detail:\n\
         \n\
         Migration: {}\n\
         Version: {}\n\
         Name: {}\n\
         {status}\n\
         \n\
         UP Migration SQL (applies the change):\n\
         ```sql\n{up_sql}\n```\n\
         \n\
         DOWN Migration SQL (rollback):\n\
         ```sql\n{down_sql}\n```\n\
         \n\
         Please provide:\n\
         1. A clear explanation of what this migration does\n\
         2. The database schema changes being made\n\
         3. Any potential risks or considerations\n\
         4. The purpose of the rollback strategy (if provided)\n",
        migration.full_version, migration.version, migration.name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SqliteAdapter;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn engine() -> (TempDir, MigrationEngine) {
        let temp = TempDir::new().unwrap();
        let engine = MigrationEngine::new(
            DatabaseAdapter::Sqlite(SqliteAdapter::new(temp.path().join("test.db"))),
            temp.path().join("migrations"),
        );
        (temp, engine)
    }

    fn file(version: &str, checksum: &str) -> MigrationFile {
        MigrationFile {
            version: version.into(),
            name: "m".into(),
            full_version: format!("{version}_m"),
            filename: format!("{version}_m.up.sql"),
            checksum: checksum.into(),
            path: PathBuf::from(format!("{version}_m.up.sql")),
            has_down: false,
        }
    }

    fn record(version: &str, checksum: &str) -> AppliedRecord {
        AppliedRecord {
            version: version.into(),
            name: "m".into(),
            checksum: checksum.into(),
            applied_at: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap(),
            execution_time_ms: Some(4),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly", 7), "exactly");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_partition() {
        let catalog = vec![file("001", "a"), file("002", "b"), file("003", "c")];
        let records = vec![record("001", "a"), record("002", "changed"), record("009", "z")];

        let status = partition(catalog, &records);
        let applied: Vec<&str> = status.applied.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(applied, vec!["001", "002"]);
        assert_eq!(status.pending.len(), 1);
        assert_eq!(status.pending[0].version, "003");
        assert_eq!(status.current_version.as_deref(), Some("009"));
        assert_eq!(status.missing, vec!["009"]);
        assert_eq!(
            status.drift_detected,
            vec![Drift {
                version: "002".into(),
                expected: "changed".into(),
                actual: "b".into(),
            }]
        );
    }

    #[test]
    fn test_partition_empty_ledger() {
        let status = partition(vec![file("001", "a")], &[]);
        assert!(status.current_version.is_none());
        assert!(!status.is_up_to_date());
        assert!(status.missing.is_empty());
    }

    #[test]
    fn test_render_status_without_drift() {
        let status = partition(vec![file("001", "a"), file("002", "b")], &[record("001", "a")]);
        let text = render_status(Backend::Sqlite, &status);

        assert!(text.starts_with("DATABASE MIGRATION STATUS"));
        assert!(text.contains("Database Type: sqlite"));
        assert!(text.contains("Current Version: 001"));
        assert!(text.contains("PENDING MIGRATIONS:\n  - 002_m"));
        assert!(text.contains("APPLIED MIGRATIONS:\n  - 001_m"));
        assert!(!text.contains("DRIFT"));
    }

    #[test]
    fn test_render_status_with_drift_and_empty_lists() {
        let status = partition(vec![file("001", "a")], &[record("001", "x")]);
        let text = render_status(Backend::Postgres, &status);

        assert!(text.contains("PENDING MIGRATIONS:\n  (none)"));
        assert!(text.contains("DRIFT DETECTED:\n  - 001: checksum mismatch"));
    }

    #[test]
    fn test_render_explanation_pending_without_down() {
        let text = render_explanation(&file("004", "a"), None, "CREATE TABLE t (id INT);", "");
        assert!(text.contains("Migration: 004_m"));
        assert!(text.contains("Status: Pending (not yet applied)"));
        assert!(text.contains("```sql\nCREATE TABLE t (id INT);\n```"));
        assert!(text.contains("(No rollback script provided)"));
        assert!(text.contains("4. The purpose of the rollback strategy"));
    }

    #[test]
    fn test_render_explanation_applied() {
        let rec = record("004", "a");
        let text = render_explanation(&file("004", "a"), Some(&rec), "SELECT 1;", "SELECT 2;");
        assert!(text.contains("Status: Applied\nApplied At: 2024-01-15T14:30:52+00:00"));
        assert!(text.contains("Execution Time: 4ms"));
        assert!(text.contains("```sql\nSELECT 2;\n```"));
    }

    #[test]
    fn test_create_writes_headers() {
        let (_temp, engine) = engine();
        let created = engine
            .create("Add Users", "CREATE TABLE users (id INT);", Some("DROP TABLE users;"))
            .unwrap();

        assert_eq!(created.version, "001");
        assert_eq!(created.name, "add_users");
        let up = fs::read_to_string(&created.up_file).unwrap();
        assert!(up.starts_with("-- Migration: 001_add_users\n-- Created: "));
        assert!(up.contains("-- Description: Add Users\n\nCREATE TABLE users (id INT);"));

        let down = fs::read_to_string(created.down_file.unwrap()).unwrap();
        assert!(down.starts_with("-- Rollback: 001_add_users\n"));
        assert!(down.ends_with("DROP TABLE users;\n"));
    }

    #[test]
    fn test_create_without_down() {
        let (_temp, engine) = engine();
        let created = engine.create("x", "SELECT 1;", Some("   ")).unwrap();
        assert!(created.down_file.is_none());
        assert!(!engine.migrations_dir().join("001_x.down.sql").exists());
    }

    #[test]
    fn test_create_increments_version() {
        let (_temp, engine) = engine();
        engine.create("first", "SELECT 1;", None).unwrap();
        let second = engine.create("second", "SELECT 2;", None).unwrap();
        assert_eq!(second.version, "002");
    }

    #[test]
    fn test_create_rejects_bad_name() {
        let (_temp, engine) = engine();
        let err = engine.create("../escape", "SELECT 1;", None).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidName(_)));
    }

    #[test]
    fn test_run_query_blocked_before_connecting() {
        let engine = MigrationEngine::new(
            DatabaseAdapter::Sqlite(SqliteAdapter::new("/nonexistent/dir/test.db")),
            "/nonexistent/migrations",
        );
        let err = engine.run_query("drop table x").unwrap_err();
        assert!(matches!(err, MigrateError::SafetyBlocked("DROP")));
    }

    #[test]
    fn test_run_query_select() {
        let (_temp, engine) = engine();
        match engine.run_query("SELECT 1 AS one").unwrap() {
            QueryOutcome::Rows(rows) => {
                assert_eq!(rows.columns, vec!["one"]);
                assert_eq!(rows.row_count, 1);
                assert_eq!(rows.rows[0][0], serde_json::json!(1));
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn test_schema_text_empty_database() {
        let (_temp, engine) = engine();
        assert_eq!(engine.schema_text().unwrap(), NO_TABLES_MESSAGE);
    }

    #[test]
    fn test_explain_unknown_version() {
        let (_temp, engine) = engine();
        let text = engine.explain("404").unwrap();
        assert_eq!(text, "Migration 404 not found. Please check the version number.");
    }

    #[test]
    fn test_read_sql_missing_down() {
        let (_temp, engine) = engine();
        engine.create("only_up", "SELECT 1;", None).unwrap();

        assert!(engine.read_sql("001", Direction::Up).unwrap().contains("SELECT 1;"));
        let err = engine.read_sql("001_only_up", Direction::Down).unwrap_err();
        assert!(matches!(err, MigrateError::RollbackFileMissing { .. }));
    }
}
