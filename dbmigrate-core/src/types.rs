//! Shared data model for migrations, ledger rows and schema introspection

use crate::error::Failure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

pub const UP_SUFFIX: &str = ".up.sql";
pub const DOWN_SUFFIX: &str = ".down.sql";

/// Which script of a migration pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl Direction {
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Up => UP_SUFFIX,
            Direction::Down => DOWN_SUFFIX,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// A migration discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Prefix before the first underscore of the file name
    pub version: String,

    /// Everything after the first underscore
    pub name: String,

    /// `{version}_{name}`
    pub full_version: String,

    pub filename: String,

    /// First 16 hex chars of the SHA-256 of the up-script
    pub checksum: String,

    /// Path of the up-script
    pub path: PathBuf,

    /// Whether a `.down.sql` companion existed when the directory was scanned
    #[serde(default)]
    pub has_down: bool,
}

impl MigrationFile {
    pub fn up_path(&self) -> &Path {
        &self.path
    }

    pub fn down_path(&self) -> PathBuf {
        self.script_path(Direction::Down)
    }

    pub fn script_path(&self, direction: Direction) -> PathBuf {
        match direction {
            Direction::Up => self.path.clone(),
            Direction::Down => self
                .path
                .with_file_name(format!("{}{}", self.full_version, DOWN_SUFFIX)),
        }
    }

    /// Matches either the bare version or the full version
    pub fn matches(&self, id: &str) -> bool {
        self.version == id || self.full_version == id
    }
}

/// A row of the applied-migration ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub version: String,
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
    pub execution_time_ms: Option<i64>,
}

/// Checksum mismatch between the ledger and the file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drift {
    pub version: String,
    /// Checksum recorded when the migration was applied
    pub expected: String,
    /// Checksum of the file as it is now
    pub actual: String,
}

/// Snapshot of catalog versus ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub pending: Vec<MigrationFile>,
    pub applied: Vec<MigrationFile>,
    pub drift_detected: Vec<Drift>,
    pub current_version: Option<String>,
    /// Ledger versions whose up-script no longer exists
    #[serde(default)]
    pub missing: Vec<String>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_drift(&self) -> bool {
        !self.drift_detected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift_detected: bool,
    pub message: String,
    pub details: Vec<Drift>,
}

impl DriftReport {
    pub fn new(details: Vec<Drift>) -> Self {
        let message = if details.is_empty() {
            "No drift detected. All migration checksums match."
        } else {
            "WARNING: Migration files have been modified after being applied!"
        };
        Self {
            drift_detected: !details.is_empty(),
            message: message.to_string(),
            details,
        }
    }
}

/// Outcome of a single apply or rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub version: String,
    pub name: String,
    pub direction: Direction,
    pub dry_run: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<i64>,

    /// First 500 characters of the script, for dry runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_preview: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-migration entry of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded(MigrationReport),
    Failed(Failure),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded(_))
    }
}

impl Serialize for StepOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StepOutcome::Succeeded(report) => Flagged::new(true, report).serialize(serializer),
            StepOutcome::Failed(failure) => Flagged::new(false, failure).serialize(serializer),
        }
    }
}

/// A payload with a `success` flag merged into it
#[derive(Debug, Serialize)]
pub struct Flagged<'a, T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: &'a T,
}

impl<'a, T: Serialize> Flagged<'a, T> {
    pub fn new(success: bool, body: &'a T) -> Self {
        Self { success, body }
    }
}

/// Result of applying every pending migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Pending migrations when the batch started
    pub total: usize,
    pub attempted: usize,
    /// Successful entries in `results`
    pub applied: usize,
    pub dry_run: bool,
    pub results: Vec<StepOutcome>,
}

/// Files written by `create_migration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedMigration {
    pub version: String,
    pub name: String,
    pub up_file: PathBuf,
    pub down_file: Option<PathBuf>,
}

/// Column definition for schema introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    pub nullable: bool,

    #[serde(default)]
    pub default: Option<String>,

    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_name: String,
    pub column_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub row_count: i64,
    pub indexes: Vec<IndexInfo>,
}

/// Rows returned by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Index of a column by case-insensitive name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }
}

/// Outcome of a read-only query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(QueryResult),
    NoResults { message: String },
}

/// Order versions numerically when both are integers, lexicographically otherwise.
///
/// Numeric versions sort before non-numeric ones; numeric ties ("1" vs "001")
/// fall back to string order so the ordering stays total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, MigrateError};

    fn file(version: &str, name: &str) -> MigrationFile {
        let full_version = format!("{version}_{name}");
        MigrationFile {
            version: version.to_string(),
            name: name.to_string(),
            filename: format!("{full_version}.up.sql"),
            path: PathBuf::from(format!("/m/{full_version}.up.sql")),
            full_version,
            checksum: "0123456789abcdef".to_string(),
            has_down: false,
        }
    }

    #[test]
    fn test_compare_versions_numeric() {
        assert_eq!(compare_versions("001", "002"), Ordering::Less);
        assert_eq!(compare_versions("010", "002"), Ordering::Greater);
        assert_eq!(compare_versions("9", "10"), Ordering::Less);
        assert_eq!(compare_versions("002", "002"), Ordering::Equal);
    }

    #[test]
    fn test_compare_versions_mixed() {
        assert_eq!(compare_versions("999", "abc"), Ordering::Less);
        assert_eq!(compare_versions("abc", "abd"), Ordering::Less);
        assert_eq!(compare_versions("1", "001"), Ordering::Greater);
    }

    #[test]
    fn test_script_paths() {
        let m = file("001", "create_users");
        assert_eq!(m.up_path(), Path::new("/m/001_create_users.up.sql"));
        assert_eq!(m.down_path(), PathBuf::from("/m/001_create_users.down.sql"));
        assert_eq!(m.script_path(Direction::Up), m.path);
    }

    #[test]
    fn test_matches_version_or_full_version() {
        let m = file("003", "add_index");
        assert!(m.matches("003"));
        assert!(m.matches("003_add_index"));
        assert!(!m.matches("003_add"));
    }

    #[test]
    fn test_drift_report_messages() {
        let clean = DriftReport::new(Vec::new());
        assert!(!clean.drift_detected);
        assert_eq!(
            clean.message,
            "No drift detected. All migration checksums match."
        );

        let drifted = DriftReport::new(vec![Drift {
            version: "001".into(),
            expected: "a".into(),
            actual: "b".into(),
        }]);
        assert!(drifted.drift_detected);
        assert!(drifted.message.starts_with("WARNING"));
    }

    #[test]
    fn test_step_outcome_serializes_flat_with_success_flag() {
        let ok = StepOutcome::Succeeded(MigrationReport {
            version: "001".into(),
            name: "init".into(),
            direction: Direction::Up,
            dry_run: false,
            execution_time_ms: Some(12),
            sql_preview: None,
            statement_count: None,
            message: None,
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["version"], "001");
        assert_eq!(json["execution_time_ms"], 12);
        assert!(json.get("sql_preview").is_none());

        let failed = StepOutcome::Failed(Failure::from(MigrateError::AlreadyApplied(
            "002".into(),
        )));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "already_applied");
        assert_eq!(json["error"], "Migration 002 already applied");
        assert!(!StepOutcome::Failed(Failure {
            kind: ErrorKind::NotFound,
            version: None,
            error: String::new()
        })
        .is_success());
    }

    #[test]
    fn test_query_outcome_untagged() {
        let rows = QueryOutcome::Rows(QueryResult::new(
            vec!["x".into()],
            vec![vec![serde_json::json!(1)]],
        ));
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["columns"][0], "x");

        let none = QueryOutcome::NoResults {
            message: "Query executed, no results returned".into(),
        };
        let json = serde_json::to_value(&none).unwrap();
        assert_eq!(json["message"], "Query executed, no results returned");
    }

    #[test]
    fn test_column_info_serializes_type_field() {
        let column = ColumnInfo {
            name: "id".into(),
            data_type: "INTEGER".into(),
            nullable: false,
            default: None,
            primary_key: true,
        };
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["type"], "INTEGER");
        assert_eq!(json["primary_key"], true);
    }
}
