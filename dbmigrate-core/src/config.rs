//! Connection and directory settings
//!
//! Settings are read from `DBMIGRATE_*` environment variables (after loading an
//! optional `.env` file) or assembled in code with [`Settings::builder()`].
//!
//! | Variable | Default |
//! |---|---|
//! | `DBMIGRATE_DB_TYPE` | `sqlite` |
//! | `DBMIGRATE_DB_PATH` | `database.db` |
//! | `DBMIGRATE_MIGRATIONS_DIR` | `./migrations` |
//! | `DBMIGRATE_DB_HOST` | `localhost` |
//! | `DBMIGRATE_DB_PORT` | `5432` (postgres) / `3306` (mysql) |
//! | `DBMIGRATE_DB_DATABASE` | empty |
//! | `DBMIGRATE_DB_USER` | empty |
//! | `DBMIGRATE_DB_PASSWORD` | empty |

use crate::adapter::Backend;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "DBMIGRATE_";

pub const DEFAULT_SQLITE_PATH: &str = "database.db";
pub const DEFAULT_MIGRATIONS_DIR: &str = "./migrations";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Errors that can occur while loading [`Settings`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown database type '{0}' (expected sqlite, postgres or mysql)")]
    UnknownBackend(String),

    #[error("invalid port '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to load env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Connection parameters for client/server backends
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            database: String::new(),
            user: String::new(),
            password: String::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which database to migrate and how to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf },
    Postgres(ServerConfig),
    Mysql(ServerConfig),
}

impl DatabaseConfig {
    pub fn backend(&self) -> Backend {
        match self {
            DatabaseConfig::Sqlite { .. } => Backend::Sqlite,
            DatabaseConfig::Postgres(_) => Backend::Postgres,
            DatabaseConfig::Mysql(_) => Backend::Mysql,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub migrations_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal; only malformed ones are worth reporting.
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: PathBuf::from(".env"),
                    source,
                })
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an explicit env file plus the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any `DBMIGRATE_*` key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.is_empty())
        };

        let backend = match get("DB_TYPE") {
            Some(name) => name
                .parse::<Backend>()
                .map_err(|_| ConfigError::UnknownBackend(name))?,
            None => Backend::Sqlite,
        };

        let database = match backend {
            Backend::Sqlite => DatabaseConfig::Sqlite {
                path: PathBuf::from(get("DB_PATH").unwrap_or_else(|| DEFAULT_SQLITE_PATH.into())),
            },
            Backend::Postgres | Backend::Mysql => {
                let default_port = match backend {
                    Backend::Postgres => DEFAULT_POSTGRES_PORT,
                    _ => DEFAULT_MYSQL_PORT,
                };
                let port = match get("DB_PORT") {
                    Some(value) => value
                        .parse::<u16>()
                        .map_err(|source| ConfigError::InvalidPort { value, source })?,
                    None => default_port,
                };
                let server = ServerConfig::new(port)
                    .with_host(get("DB_HOST").unwrap_or_else(|| DEFAULT_HOST.into()))
                    .with_database(get("DB_DATABASE").unwrap_or_default())
                    .with_user(get("DB_USER").unwrap_or_default())
                    .with_password(get("DB_PASSWORD").unwrap_or_default());
                if backend == Backend::Postgres {
                    DatabaseConfig::Postgres(server)
                } else {
                    DatabaseConfig::Mysql(server)
                }
            }
        };

        Ok(Settings {
            database,
            migrations_dir: PathBuf::from(
                get("MIGRATIONS_DIR").unwrap_or_else(|| DEFAULT_MIGRATIONS_DIR.into()),
            ),
        })
    }
}

/// Builder for [`Settings`]
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    database: Option<DatabaseConfig>,
    migrations_dir: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Use an SQLite database file
    pub fn sqlite(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(DatabaseConfig::Sqlite { path: path.into() });
        self
    }

    pub fn postgres(mut self, server: ServerConfig) -> Self {
        self.database = Some(DatabaseConfig::Postgres(server));
        self
    }

    pub fn mysql(mut self, server: ServerConfig) -> Self {
        self.database = Some(DatabaseConfig::Mysql(server));
        self
    }

    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            database: self.database.unwrap_or_default(),
            migrations_dir: self
                .migrations_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_DIR)),
        }
    }
}
