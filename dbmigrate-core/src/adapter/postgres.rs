//! PostgreSQL backend
//!
//! Uses the synchronous `postgres` client. Ad-hoc queries go through the simple
//! query protocol so every cell comes back as text, whatever its type.

use super::{Backend, SqlParam};
use crate::config::ServerConfig;
use crate::error::{MigrateError, Result};
use crate::types::{ColumnInfo, IndexInfo, QueryResult, TableDetail, TableSummary};
use ::postgres::types::ToSql;
use ::postgres::{Client, NoTls, SimpleQueryMessage};
use serde_json::Value;

const COLUMNS_SQL: &str = "\
SELECT c.column_name::text,
       c.data_type::text,
       c.is_nullable::text,
       c.column_default::text,
       EXISTS (
           SELECT 1
           FROM information_schema.table_constraints tc
           JOIN information_schema.key_column_usage kcu
             ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
           WHERE tc.constraint_type = 'PRIMARY KEY'
             AND tc.table_schema = c.table_schema
             AND tc.table_name = c.table_name
             AND kcu.column_name = c.column_name
       ) AS primary_key
FROM information_schema.columns c
WHERE c.table_schema = 'public' AND c.table_name = $1
ORDER BY c.ordinal_position";

const TABLES_SQL: &str = "\
SELECT t.table_name::text, COUNT(c.column_name)::bigint
FROM information_schema.tables t
LEFT JOIN information_schema.columns c
  ON c.table_schema = t.table_schema AND c.table_name = t.table_name
WHERE t.table_schema = 'public' AND t.table_type = 'BASE TABLE'
GROUP BY t.table_name
ORDER BY t.table_name";

const INDEXES_SQL: &str = "\
SELECT indexname::text, indexdef
FROM pg_indexes
WHERE schemaname = 'public' AND tablename = $1
ORDER BY indexname";

/// Ledger timestamps are written and read back in UTC.
const SESSION_OPTIONS: &str = "-c TimeZone=UTC";

#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    server: ServerConfig,
}

impl PostgresAdapter {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn connect(&self) -> Result<Client> {
        Ok(self.config().connect(NoTls)?)
    }

    fn config(&self) -> ::postgres::Config {
        let mut config = ::postgres::Config::new();
        config
            .host(&self.server.host)
            .port(self.server.port)
            .dbname(&self.server.database)
            .user(&self.server.user)
            .options(SESSION_OPTIONS);
        if !self.server.password.is_empty() {
            config.password(&self.server.password);
        }
        config
    }
}

pub(crate) fn execute_script(client: &mut Client, sql: &str) -> Result<()> {
    client.batch_execute(sql)?;
    Ok(())
}

pub(crate) fn execute(client: &mut Client, sql: &str, params: &[SqlParam]) -> Result<u64> {
    let owned: Vec<Box<dyn ToSql + Sync>> = params
        .iter()
        .map(|param| -> Box<dyn ToSql + Sync> {
            match param {
                SqlParam::Text(s) => Box::new(s.clone()),
                SqlParam::Integer(i) => Box::new(*i),
            }
        })
        .collect();
    let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(|p| p.as_ref()).collect();
    Ok(client.execute(sql, &refs)?)
}

/// Run `sql` over the simple query protocol and keep the last result set.
pub(crate) fn query(client: &mut Client, sql: &str) -> Result<Option<QueryResult>> {
    let messages = client.simple_query(sql)?;
    Ok(collect_simple_rows(messages))
}

fn collect_simple_rows(messages: Vec<SimpleQueryMessage>) -> Option<QueryResult> {
    let mut result: Option<(Vec<String>, Vec<Vec<Value>>)> = None;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                let names = columns.iter().map(|c| c.name().to_string()).collect();
                result = Some((names, Vec::new()));
            }
            SimpleQueryMessage::Row(row) => {
                let (names, rows) = result.get_or_insert_with(|| {
                    let names = row.columns().iter().map(|c| c.name().to_string()).collect();
                    (names, Vec::new())
                });
                let values = (0..names.len())
                    .map(|i| match row.get(i) {
                        Some(text) => Value::String(text.to_string()),
                        None => Value::Null,
                    })
                    .collect();
                rows.push(values);
            }
            _ => {}
        }
    }

    result.map(|(columns, rows)| QueryResult::new(columns, rows))
}

pub(crate) fn get_schema(client: &mut Client) -> Result<String> {
    let tables = list_tables(client)?;
    let mut blocks = Vec::with_capacity(tables.len());
    for table in tables {
        let columns = table_columns(client, &table.table_name)?;
        blocks.push(synthesize_create_table(&table.table_name, &columns));
    }
    Ok(blocks.join("\n\n"))
}

pub(crate) fn list_tables(client: &mut Client) -> Result<Vec<TableSummary>> {
    let rows = client.query(TABLES_SQL, &[])?;
    rows.iter()
        .map(|row| -> Result<TableSummary> {
            Ok(TableSummary {
                table_name: row.try_get(0)?,
                column_count: row.try_get(1)?,
            })
        })
        .collect()
}

fn table_columns(client: &mut Client, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = client.query(COLUMNS_SQL, &[&table])?;
    rows.iter()
        .map(|row| -> Result<ColumnInfo> {
            let is_nullable: String = row.try_get(2)?;
            Ok(ColumnInfo {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default: row.try_get(3)?,
                primary_key: row.try_get(4)?,
            })
        })
        .collect()
}

pub(crate) fn inspect_table(client: &mut Client, table: &str) -> Result<TableDetail> {
    let columns = table_columns(client, table)?;
    if columns.is_empty() {
        return Err(MigrateError::TableNotFound(table.to_string()));
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM {}",
        Backend::Postgres.quote_ident(table)
    );
    let row_count: i64 = client.query_one(count_sql.as_str(), &[])?.try_get(0)?;

    let indexes = client
        .query(INDEXES_SQL, &[&table])?
        .iter()
        .map(|row| -> Result<IndexInfo> {
            Ok(IndexInfo {
                name: row.try_get(0)?,
                definition: row.try_get(1)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TableDetail {
        table: table.to_string(),
        columns,
        row_count,
        indexes,
    })
}

/// Rebuild a `CREATE TABLE` statement from catalog column metadata.
pub fn synthesize_create_table(table: &str, columns: &[ColumnInfo]) -> String {
    let mut lines: Vec<String> = columns
        .iter()
        .map(|column| {
            let mut line = format!("    {} {}", column.name, column.data_type);
            if !column.nullable {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                line.push_str(" DEFAULT ");
                line.push_str(default);
            }
            line
        })
        .collect();

    let keys: Vec<&str> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    if !keys.is_empty() {
        lines.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
    }

    format!("CREATE TABLE {table} (\n{}\n);", lines.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(
        name: &str,
        data_type: &str,
        nullable: bool,
        default: Option<&str>,
        pk: bool,
    ) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            default: default.map(str::to_string),
            primary_key: pk,
        }
    }

    #[test]
    fn test_session_runs_in_utc() {
        let adapter = PostgresAdapter::new(ServerConfig {
            host: "db".into(),
            port: 5432,
            database: "app".into(),
            user: "app".into(),
            password: String::new(),
        });
        let config = adapter.config();
        assert_eq!(config.get_options(), Some("-c TimeZone=UTC"));
        assert_eq!(config.get_password(), None);
    }

    #[test]
    fn test_synthesize_create_table() {
        let ddl = synthesize_create_table(
            "users",
            &[
                column("id", "integer", false, Some("nextval('users_id_seq'::regclass)"), true),
                column("email", "text", false, None, false),
                column("bio", "text", true, None, false),
            ],
        );

        assert_eq!(
            ddl,
            "CREATE TABLE users (\n    \
             id integer NOT NULL DEFAULT nextval('users_id_seq'::regclass),\n    \
             email text NOT NULL,\n    \
             bio text,\n    \
             PRIMARY KEY (id)\n);"
        );
    }

    #[test]
    fn test_synthesize_composite_key() {
        let ddl = synthesize_create_table(
            "memberships",
            &[
                column("user_id", "integer", false, None, true),
                column("group_id", "integer", false, None, true),
            ],
        );
        assert!(ddl.contains("PRIMARY KEY (user_id, group_id)"));
    }

    #[test]
    fn test_synthesize_without_key() {
        let ddl = synthesize_create_table("log", &[column("line", "text", true, None, false)]);
        assert_eq!(ddl, "CREATE TABLE log (\n    line text\n);");
    }

    #[test]
    fn test_collect_simple_rows_without_result_set() {
        assert!(collect_simple_rows(Vec::new()).is_none());
        assert!(collect_simple_rows(vec![SimpleQueryMessage::CommandComplete(3)]).is_none());
    }
}
