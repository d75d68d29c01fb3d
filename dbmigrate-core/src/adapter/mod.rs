//! Database backends
//!
//! Three dialects are supported and no others, so the adapter is a closed enum
//! rather than a trait object. Each backend module provides free functions over
//! its native connection type; this module dispatches on the variant.
//!
//! Connections are opened per operation and dropped when the operation returns.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::splitter::split_statements;
use crate::types::{QueryResult, TableDetail, TableSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub use self::mysql::MysqlAdapter;
pub use self::postgres::PostgresAdapter;
pub use self::sqlite::SqliteAdapter;

/// SQL dialect tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Postgres,
    Mysql,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::Mysql => "mysql",
        }
    }

    /// Positional parameter marker for the 1-based `position`.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Backend::Postgres => format!("${position}"),
            Backend::Sqlite | Backend::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Backend::Mysql => format!("`{}`", ident.replace('`', "``")),
            Backend::Sqlite | Backend::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    pub(crate) fn begin_statement(self) -> &'static str {
        match self {
            Backend::Mysql => "START TRANSACTION",
            Backend::Sqlite | Backend::Postgres => "BEGIN",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown database type '{}'", self.0)
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "mysql" | "mariadb" => Ok(Backend::Mysql),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

/// A configured backend
#[derive(Debug, Clone)]
pub enum DatabaseAdapter {
    Sqlite(SqliteAdapter),
    Postgres(PostgresAdapter),
    Mysql(MysqlAdapter),
}

impl DatabaseAdapter {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        match config {
            DatabaseConfig::Sqlite { path } => DatabaseAdapter::Sqlite(SqliteAdapter::new(path)),
            DatabaseConfig::Postgres(server) => {
                DatabaseAdapter::Postgres(PostgresAdapter::new(server.clone()))
            }
            DatabaseConfig::Mysql(server) => {
                DatabaseAdapter::Mysql(MysqlAdapter::new(server.clone()))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            DatabaseAdapter::Sqlite(_) => Backend::Sqlite,
            DatabaseAdapter::Postgres(_) => Backend::Postgres,
            DatabaseAdapter::Mysql(_) => Backend::Mysql,
        }
    }

    pub fn placeholder(&self, position: usize) -> String {
        self.backend().placeholder(position)
    }

    /// Open a fresh connection. It is closed when dropped.
    pub fn connect(&self) -> Result<Connection> {
        debug!(backend = %self.backend(), "opening connection");
        Ok(match self {
            DatabaseAdapter::Sqlite(adapter) => Connection::Sqlite(adapter.connect()?),
            DatabaseAdapter::Postgres(adapter) => Connection::Postgres(adapter.connect()?),
            DatabaseAdapter::Mysql(adapter) => Connection::Mysql(adapter.connect()?),
        })
    }

    /// Open a connection and run `SELECT 1`.
    pub fn test_connection(&self) -> Result<()> {
        let mut conn = self.connect()?;
        conn.query("SELECT 1")?;
        Ok(())
    }

    /// Full DDL of the database, one `CREATE TABLE` block per table.
    pub fn get_schema(&self) -> Result<String> {
        match self {
            DatabaseAdapter::Sqlite(adapter) => sqlite::get_schema(&adapter.connect()?),
            DatabaseAdapter::Postgres(adapter) => postgres::get_schema(&mut adapter.connect()?),
            DatabaseAdapter::Mysql(adapter) => mysql::get_schema(&mut adapter.connect()?),
        }
    }

    pub fn list_tables(&self) -> Result<Vec<TableSummary>> {
        match self {
            DatabaseAdapter::Sqlite(adapter) => sqlite::list_tables(&adapter.connect()?),
            DatabaseAdapter::Postgres(adapter) => postgres::list_tables(&mut adapter.connect()?),
            DatabaseAdapter::Mysql(adapter) => mysql::list_tables(&mut adapter.connect()?),
        }
    }

    pub fn inspect_table(&self, table: &str) -> Result<TableDetail> {
        match self {
            DatabaseAdapter::Sqlite(adapter) => sqlite::inspect_table(&adapter.connect()?, table),
            DatabaseAdapter::Postgres(adapter) => {
                postgres::inspect_table(&mut adapter.connect()?, table)
            }
            DatabaseAdapter::Mysql(adapter) => mysql::inspect_table(&mut adapter.connect()?, table),
        }
    }

    pub fn execute_script(&self, conn: &mut Connection, sql: &str) -> Result<()> {
        conn.execute_script(sql)
    }
}

/// An open connection to one of the backends
pub enum Connection {
    Sqlite(rusqlite::Connection),
    Postgres(::postgres::Client),
    Mysql(::mysql::Conn),
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Connection").field(&self.backend()).finish()
    }
}

impl Connection {
    pub fn backend(&self) -> Backend {
        match self {
            Connection::Sqlite(_) => Backend::Sqlite,
            Connection::Postgres(_) => Backend::Postgres,
            Connection::Mysql(_) => Backend::Mysql,
        }
    }

    /// Execute a script that may hold several statements.
    ///
    /// SQLite and PostgreSQL run the text natively. MySQL has no multi-statement
    /// protocol enabled, so the script is split with a tokenizer first.
    pub fn execute_script(&mut self, sql: &str) -> Result<()> {
        match self {
            Connection::Sqlite(conn) => sqlite::execute_script(conn, sql),
            Connection::Postgres(client) => postgres::execute_script(client, sql),
            Connection::Mysql(conn) => {
                let statements = split_statements(sql, Backend::Mysql)?;
                debug!(count = statements.len(), "executing split MySQL script");
                for statement in &statements {
                    mysql::execute_script(conn, statement)?;
                }
                Ok(())
            }
        }
    }

    /// Execute one parameterized statement, returning affected rows.
    pub fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        match self {
            Connection::Sqlite(conn) => sqlite::execute(conn, sql, params),
            Connection::Postgres(client) => postgres::execute(client, sql, params),
            Connection::Mysql(conn) => mysql::execute(conn, sql, params),
        }
    }

    /// Run a statement and collect its rows.
    ///
    /// Returns `None` when the statement produces no result set.
    pub fn query(&mut self, sql: &str) -> Result<Option<QueryResult>> {
        match self {
            Connection::Sqlite(conn) => sqlite::query(conn, sql),
            Connection::Postgres(client) => postgres::query(client, sql),
            Connection::Mysql(conn) => mysql::query(conn, sql),
        }
    }

    /// Run `f` inside BEGIN/COMMIT, rolling back if it fails.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let begin = self.backend().begin_statement();
        self.run_control(begin)?;
        match f(self) {
            Ok(value) => {
                self.run_control("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.run_control("ROLLBACK") {
                    warn!(error = %rollback_err, "rollback after failure also failed");
                }
                Err(err)
            }
        }
    }

    fn run_control(&mut self, statement: &str) -> Result<()> {
        match self {
            Connection::Sqlite(conn) => sqlite::execute_script(conn, statement),
            Connection::Postgres(client) => postgres::execute_script(client, statement),
            Connection::Mysql(conn) => mysql::execute_script(conn, statement),
        }
    }
}
