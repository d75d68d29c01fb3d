//! SQLite backend

use super::{Backend, SqlParam};
use crate::error::{MigrateError, Result};
use crate::types::{ColumnInfo, IndexInfo, QueryResult, TableDetail, TableSummary};
use base64::Engine;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SqliteAdapter {
    path: PathBuf,
}

impl SqliteAdapter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (creating if needed) the database file.
    ///
    /// Foreign key enforcement stays at SQLite's default of off; scripts that
    /// want it can turn it on themselves.
    pub fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

pub(crate) fn execute_script(conn: &Connection, sql: &str) -> Result<()> {
    conn.execute_batch(sql)?;
    Ok(())
}

pub(crate) fn execute(conn: &Connection, sql: &str, params: &[SqlParam]) -> Result<u64> {
    let values = params.iter().map(|param| match param {
        SqlParam::Text(s) => SqliteValue::Text(s.clone()),
        SqlParam::Integer(i) => SqliteValue::Integer(*i),
    });
    let affected = conn.execute(sql, params_from_iter(values))?;
    Ok(affected as u64)
}

pub(crate) fn query(conn: &Connection, sql: &str) -> Result<Option<QueryResult>> {
    let mut stmt = conn.prepare(sql)?;
    let column_count = stmt.column_count();
    if column_count == 0 {
        stmt.execute([])?;
        return Ok(None);
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(to_json(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(Some(QueryResult::new(columns, out)))
}

/// Convert an SQLite value to JSON. Blobs become base64 strings.
pub(crate) fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

pub(crate) fn get_schema(conn: &Connection) -> Result<String> {
    let mut stmt = conn.prepare(
        "SELECT sql FROM sqlite_master \
         WHERE type = 'table' AND sql IS NOT NULL AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
    )?;
    let blocks = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .map(|ddl| ddl.map(|ddl| format!("{};", ddl.trim_end_matches(';'))))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(blocks.join("\n\n"))
}

pub(crate) fn list_tables(conn: &Connection) -> Result<Vec<TableSummary>> {
    let mut stmt = conn.prepare(
        "SELECT m.name, (SELECT COUNT(*) FROM pragma_table_info(m.name)) \
         FROM sqlite_master m \
         WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY m.name",
    )?;
    let tables = stmt
        .query_map([], |row| {
            Ok(TableSummary {
                table_name: row.get(0)?,
                column_count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tables)
}

pub(crate) fn inspect_table(conn: &Connection, table: &str) -> Result<TableDetail> {
    let quoted = Backend::Sqlite.quote_ident(table);

    let exists = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(MigrateError::TableNotFound(table.to_string()));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
    let columns = stmt
        .query_map([], |row| {
            let notnull: i64 = row.get(3)?;
            let pk: i64 = row.get(5)?;
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get(2)?,
                nullable: notnull == 0,
                default: row.get(4)?,
                primary_key: pk > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let row_count: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {quoted}"), [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL ORDER BY name",
    )?;
    let indexes = stmt
        .query_map([table], |row| {
            Ok(IndexInfo {
                name: row.get(0)?,
                definition: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(TableDetail {
        table: table.to_string(),
        columns,
        row_count,
        indexes,
    })
}
