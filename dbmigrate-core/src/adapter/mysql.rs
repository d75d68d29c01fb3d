//! MySQL backend

use super::{Backend, SqlParam};
use crate::config::ServerConfig;
use crate::error::{MigrateError, Result};
use crate::types::{ColumnInfo, IndexInfo, QueryResult, TableDetail, TableSummary};
use ::mysql::prelude::Queryable;
use ::mysql::{Conn, OptsBuilder, Params, Value as MysqlValue};
use serde_json::Value;

const TABLES_SQL: &str = "\
SELECT t.TABLE_NAME, COUNT(c.COLUMN_NAME)
FROM information_schema.TABLES t
LEFT JOIN information_schema.COLUMNS c
  ON c.TABLE_SCHEMA = t.TABLE_SCHEMA AND c.TABLE_NAME = t.TABLE_NAME
WHERE t.TABLE_SCHEMA = DATABASE() AND t.TABLE_TYPE = 'BASE TABLE'
GROUP BY t.TABLE_NAME
ORDER BY t.TABLE_NAME";

const COLUMNS_SQL: &str = "\
SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, COLUMN_KEY
FROM information_schema.COLUMNS
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION";

const INDEXES_SQL: &str = "\
SELECT INDEX_NAME, NON_UNIQUE, GROUP_CONCAT(COLUMN_NAME ORDER BY SEQ_IN_INDEX SEPARATOR ', ')
FROM information_schema.STATISTICS
WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
GROUP BY INDEX_NAME, NON_UNIQUE
ORDER BY INDEX_NAME";

#[derive(Debug, Clone)]
pub struct MysqlAdapter {
    server: ServerConfig,
}

impl MysqlAdapter {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn connect(&self) -> Result<Conn> {
        Ok(Conn::new(self.opts())?)
    }

    fn opts(&self) -> OptsBuilder {
        OptsBuilder::new()
            .ip_or_hostname(Some(self.server.host.clone()))
            .tcp_port(self.server.port)
            .db_name(Some(self.server.database.clone()))
            .user(Some(self.server.user.clone()))
            .pass(Some(self.server.password.clone()))
            .init(vec![SESSION_INIT])
    }
}

/// `TIMESTAMP` columns convert through the session zone; keep it at UTC.
const SESSION_INIT: &str = "SET time_zone = '+00:00'";

/// Execute a single statement. Scripts are split before they get here.
pub(crate) fn execute_script(conn: &mut Conn, sql: &str) -> Result<()> {
    conn.query_drop(sql)?;
    Ok(())
}

pub(crate) fn execute(conn: &mut Conn, sql: &str, params: &[SqlParam]) -> Result<u64> {
    let values = params
        .iter()
        .map(|param| match param {
            SqlParam::Text(s) => MysqlValue::Bytes(s.as_bytes().to_vec()),
            SqlParam::Integer(i) => MysqlValue::Int(*i),
        })
        .collect();
    conn.exec_drop(sql, Params::Positional(values))?;
    Ok(conn.affected_rows())
}

pub(crate) fn query(conn: &mut Conn, sql: &str) -> Result<Option<QueryResult>> {
    let mut result = conn.query_iter(sql)?;
    let columns: Vec<String> = result
        .columns()
        .as_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect();
    if columns.is_empty() {
        return Ok(None);
    }

    let mut rows = Vec::new();
    for row in result.by_ref() {
        let row = row?;
        rows.push(row.unwrap().into_iter().map(to_json).collect());
    }
    Ok(Some(QueryResult::new(columns, rows)))
}

/// Convert a MySQL value to JSON. Text-protocol results arrive as bytes.
pub(crate) fn to_json(value: MysqlValue) -> Value {
    match value {
        MysqlValue::NULL => Value::Null,
        MysqlValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        MysqlValue::Int(n) => Value::from(n),
        MysqlValue::UInt(n) => Value::from(n),
        MysqlValue::Float(f) => serde_json::Number::from_f64(f64::from(f))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        MysqlValue::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        MysqlValue::Date(year, month, day, hour, minute, second, micros) => Value::String(
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"),
        ),
        MysqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            Value::String(format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

pub(crate) fn get_schema(conn: &mut Conn) -> Result<String> {
    let tables: Vec<String> = conn.query("SHOW TABLES")?;
    let mut blocks = Vec::with_capacity(tables.len());
    for table in tables {
        let create: Option<(String, String)> = conn.query_first(format!(
            "SHOW CREATE TABLE {}",
            Backend::Mysql.quote_ident(&table)
        ))?;
        if let Some((_, ddl)) = create {
            blocks.push(format!("{ddl};"));
        }
    }
    Ok(blocks.join("\n\n"))
}

pub(crate) fn list_tables(conn: &mut Conn) -> Result<Vec<TableSummary>> {
    let rows: Vec<(String, i64)> = conn.query(TABLES_SQL)?;
    Ok(rows
        .into_iter()
        .map(|(table_name, column_count)| TableSummary {
            table_name,
            column_count,
        })
        .collect())
}

pub(crate) fn inspect_table(conn: &mut Conn, table: &str) -> Result<TableDetail> {
    let rows: Vec<(String, String, String, Option<String>, String)> =
        conn.exec(COLUMNS_SQL, (table,))?;
    if rows.is_empty() {
        return Err(MigrateError::TableNotFound(table.to_string()));
    }
    let columns = rows
        .into_iter()
        .map(|(name, data_type, is_nullable, default, key)| ColumnInfo {
            name,
            data_type,
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            default,
            primary_key: key == "PRI",
        })
        .collect();

    let row_count: Option<i64> = conn.query_first(format!(
        "SELECT COUNT(*) FROM {}",
        Backend::Mysql.quote_ident(table)
    ))?;

    let index_rows: Vec<(String, i64, String)> = conn.exec(INDEXES_SQL, (table,))?;
    let indexes = index_rows
        .into_iter()
        .map(|(name, non_unique, columns)| {
            let definition = index_definition(table, &name, non_unique == 0, &columns);
            IndexInfo { name, definition }
        })
        .collect();

    Ok(TableDetail {
        table: table.to_string(),
        columns,
        row_count: row_count.unwrap_or(0),
        indexes,
    })
}

fn index_definition(table: &str, name: &str, unique: bool, columns: &str) -> String {
    if name == "PRIMARY" {
        format!("PRIMARY KEY ({columns})")
    } else if unique {
        format!("CREATE UNIQUE INDEX {name} ON {table} ({columns})")
    } else {
        format!("CREATE INDEX {name} ON {table} ({columns})")
    }
}
