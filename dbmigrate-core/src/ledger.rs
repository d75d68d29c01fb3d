//! Applied-migration ledger
//!
//! A single `schema_migrations` table inside the target database records every
//! applied migration. Rows are inserted on apply and deleted on rollback; they
//! are never updated.

use crate::adapter::{Backend, Connection, SqlParam};
use crate::error::{MigrateError, Result};
use crate::types::{compare_versions, AppliedRecord, MigrationFile, QueryResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

pub const LEDGER_TABLE: &str = "schema_migrations";

/// `CREATE TABLE IF NOT EXISTS` for the ledger in each dialect
pub fn create_table_sql(backend: Backend) -> String {
    let columns = match backend {
        Backend::Sqlite => {
            "version TEXT PRIMARY KEY,
            name TEXT,
            checksum TEXT,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            execution_time_ms INTEGER"
        }
        Backend::Postgres => {
            "version TEXT PRIMARY KEY,
            name TEXT,
            checksum TEXT,
            applied_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            execution_time_ms BIGINT"
        }
        // MySQL cannot index an unbounded TEXT key
        Backend::Mysql => {
            "version VARCHAR(255) PRIMARY KEY,
            name VARCHAR(255),
            checksum VARCHAR(64),
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            execution_time_ms BIGINT"
        }
    };
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
            {columns}
        )
        "#
    )
}

/// Ensures the ledger table exists
pub fn ensure_table(conn: &mut Connection) -> Result<()> {
    let sql = create_table_sql(conn.backend());
    conn.execute_script(&sql)
}

/// All ledger rows, ordered by version
pub fn applied(conn: &mut Connection) -> Result<Vec<AppliedRecord>> {
    let result = conn.query(&format!(
        "SELECT version, name, checksum, applied_at, execution_time_ms \
         FROM {LEDGER_TABLE} ORDER BY version ASC"
    ))?;
    let Some(result) = result else {
        return Ok(Vec::new());
    };

    let mut records = decode_records(&result)?;
    records.sort_by(|a, b| compare_versions(&a.version, &b.version));
    debug!(count = records.len(), "read ledger");
    Ok(records)
}

/// Insert the ledger row for a freshly applied migration.
pub fn record(conn: &mut Connection, file: &MigrationFile, execution_time_ms: i64) -> Result<()> {
    let backend = conn.backend();
    let sql = format!(
        "INSERT INTO {LEDGER_TABLE} (version, name, checksum, execution_time_ms) \
         VALUES ({}, {}, {}, {})",
        backend.placeholder(1),
        backend.placeholder(2),
        backend.placeholder(3),
        backend.placeholder(4),
    );
    conn.execute(
        &sql,
        &[
            SqlParam::from(file.version.as_str()),
            SqlParam::from(file.name.as_str()),
            SqlParam::from(file.checksum.as_str()),
            SqlParam::Integer(execution_time_ms),
        ],
    )?;
    Ok(())
}

/// Delete the ledger row for `version`.
pub fn remove(conn: &mut Connection, version: &str) -> Result<u64> {
    let sql = format!(
        "DELETE FROM {LEDGER_TABLE} WHERE version = {}",
        conn.backend().placeholder(1)
    );
    conn.execute(&sql, &[SqlParam::from(version)])
}

fn decode_records(result: &QueryResult) -> Result<Vec<AppliedRecord>> {
    let column = |name: &str| {
        result.column_index(name).ok_or_else(|| MigrateError::Decode {
            column: name.to_string(),
            message: "missing from ledger query".to_string(),
        })
    };
    let version_idx = column("version")?;
    let name_idx = column("name")?;
    let checksum_idx = column("checksum")?;
    let applied_at_idx = column("applied_at")?;
    let time_idx = column("execution_time_ms")?;

    result
        .rows
        .iter()
        .map(|row| {
            let applied_at = text(&row[applied_at_idx]).ok_or_else(|| MigrateError::Decode {
                column: "applied_at".to_string(),
                message: "NULL timestamp".to_string(),
            })?;
            Ok(AppliedRecord {
                version: text(&row[version_idx]).unwrap_or_default(),
                name: text(&row[name_idx]).unwrap_or_default(),
                checksum: text(&row[checksum_idx]).unwrap_or_default(),
                applied_at: parse_timestamp(&applied_at)?,
                execution_time_ms: integer(&row[time_idx]),
            })
        })
        .collect()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the textual `applied_at` of any backend into UTC.
///
/// Naive timestamps are taken to be UTC. SQLite's `CURRENT_TIMESTAMP` is UTC,
/// and PostgreSQL and MySQL sessions are opened with a UTC time zone.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(MigrateError::Decode {
        column: "applied_at".to_string(),
        message: format!("unrecognized timestamp '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{DatabaseAdapter, SqliteAdapter};
    use chrono::{Datelike, Timelike};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sqlite() -> (TempDir, Connection) {
        let temp = TempDir::new().unwrap();
        let adapter = DatabaseAdapter::Sqlite(SqliteAdapter::new(temp.path().join("ledger.db")));
        let conn = adapter.connect().unwrap();
        (temp, conn)
    }

    fn migration(version: &str, name: &str, checksum: &str) -> MigrationFile {
        MigrationFile {
            version: version.into(),
            name: name.into(),
            full_version: format!("{version}_{name}"),
            filename: format!("{version}_{name}.up.sql"),
            checksum: checksum.into(),
            path: PathBuf::from(format!("{version}_{name}.up.sql")),
            has_down: false,
        }
    }

    #[test]
    fn test_ensure_table_is_idempotent() {
        let (_temp, mut conn) = sqlite();
        ensure_table(&mut conn).unwrap();
        ensure_table(&mut conn).unwrap();
        assert!(applied(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_record_and_read_back() {
        let (_temp, mut conn) = sqlite();
        ensure_table(&mut conn).unwrap();

        record(&mut conn, &migration("002", "b", "bbbb"), 7).unwrap();
        record(&mut conn, &migration("001", "a", "aaaa"), 3).unwrap();

        let rows = applied(&mut conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].version, "001");
        assert_eq!(rows[0].name, "a");
        assert_eq!(rows[0].checksum, "aaaa");
        assert_eq!(rows[0].execution_time_ms, Some(3));
        assert_eq!(rows[1].version, "002");
        assert!(rows[1].applied_at.year() >= 2024);
    }

    #[test]
    fn test_duplicate_version_rejected_by_primary_key() {
        let (_temp, mut conn) = sqlite();
        ensure_table(&mut conn).unwrap();

        record(&mut conn, &migration("001", "a", "aaaa"), 1).unwrap();
        let err = record(&mut conn, &migration("001", "a", "aaaa"), 1).unwrap_err();
        assert!(matches!(err, MigrateError::Sqlite(_)));
    }

    #[test]
    fn test_remove() {
        let (_temp, mut conn) = sqlite();
        ensure_table(&mut conn).unwrap();
        record(&mut conn, &migration("001", "a", "aaaa"), 1).unwrap();

        assert_eq!(remove(&mut conn, "001").unwrap(), 1);
        assert_eq!(remove(&mut conn, "001").unwrap(), 0);
        assert!(applied(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_ledger_orders_numerically() {
        let (_temp, mut conn) = sqlite();
        ensure_table(&mut conn).unwrap();
        record(&mut conn, &migration("10", "ten", "x"), 1).unwrap();
        record(&mut conn, &migration("9", "nine", "y"), 1).unwrap();

        let versions: Vec<String> = applied(&mut conn)
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec!["9", "10"]);
    }

    #[test]
    fn test_create_table_sql_per_dialect() {
        assert!(create_table_sql(Backend::Sqlite).contains("version TEXT PRIMARY KEY"));
        assert!(create_table_sql(Backend::Postgres).contains("execution_time_ms BIGINT"));
        assert!(create_table_sql(Backend::Postgres).contains("applied_at TIMESTAMPTZ"));
        assert!(create_table_sql(Backend::Mysql).contains("version VARCHAR(255) PRIMARY KEY"));
        for backend in [Backend::Sqlite, Backend::Postgres, Backend::Mysql] {
            assert!(create_table_sql(backend).contains("CREATE TABLE IF NOT EXISTS schema_migrations"));
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let sqlite = parse_timestamp("2024-01-15 14:30:52").unwrap();
        assert_eq!((sqlite.hour(), sqlite.minute(), sqlite.second()), (14, 30, 52));

        let postgres = parse_timestamp("2024-01-15 14:30:52.123456").unwrap();
        assert_eq!(postgres.timestamp_subsec_micros(), 123456);

        let iso = parse_timestamp("2024-01-15T14:30:52").unwrap();
        assert_eq!(iso, sqlite);

        let with_offset = parse_timestamp("2024-01-15 16:30:52+02").unwrap();
        assert_eq!(with_offset, sqlite);

        let rfc3339 = parse_timestamp("2024-01-15T14:30:52Z").unwrap();
        assert_eq!(rfc3339, sqlite);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }
}
