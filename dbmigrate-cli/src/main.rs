//! `dbmigrate` command-line front end
//!
//! Logs go to stderr; stdout carries only tool output so it can be piped.

mod error;
mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dbmigrate_core::Settings;
use dbmigrate_tools::{all_tools, list_resources, read_resource, MigrationContext, ToolRegistry};
use error::CliError;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "dbmigrate=info";

/// File-based SQL migrations for SQLite, PostgreSQL and MySQL
#[derive(Parser, Debug)]
#[command(name = "dbmigrate")]
#[command(version, about)]
struct Cli {
    /// Env file to load instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Migrations directory (overrides DBMIGRATE_MIGRATIONS_DIR)
    #[arg(long, global = true)]
    migrations_dir: Option<PathBuf>,

    /// Log level for dbmigrate crates (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tools
    Tools {
        /// Print names, descriptions and input schemas as JSON
        #[arg(long)]
        json: bool,
    },
    /// Execute one tool and print its result
    Call {
        /// Tool name, e.g. apply_migration
        tool: String,

        /// Tool input as a JSON object
        #[arg(long, short)]
        input: Option<String>,
    },
    /// Print a resource, e.g. migrations://status
    Resource {
        /// Resource URI; omit to list resources
        uri: Option<String>,
    },
    /// Answer JSON requests read line by line from stdin
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let settings = load_settings(&cli).context("failed to load settings")?;
    info!(
        backend = %settings.database.backend(),
        migrations_dir = %settings.migrations_dir.display(),
        "dbmigrate starting"
    );
    let ctx = MigrationContext::from_settings(&settings);
    let registry = ToolRegistry::with_tools(all_tools(&ctx));

    Ok(run(cli.command, &registry, &ctx).await?)
}

fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(format!("dbmigrate={level}"))
            .with_context(|| format!("invalid log level '{level}'"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = match &cli.env_file {
        Some(path) => Settings::from_env_file(path)?,
        None => Settings::from_env()?,
    };
    if let Some(dir) = &cli.migrations_dir {
        settings.migrations_dir = dir.clone();
    }
    Ok(settings)
}

async fn run(
    command: Command,
    registry: &ToolRegistry,
    ctx: &MigrationContext,
) -> Result<ExitCode, CliError> {
    match command {
        Command::Tools { json } => {
            let tools = registry.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                for tool in tools {
                    println!("{:<26} {}", tool.name, tool.description);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Call { tool, input } => {
            let input = parse_input(input.as_deref())?;
            let result = registry.execute(&tool, input).await?;
            let value = result.into_value();
            match &value {
                Value::String(text) => println!("{text}"),
                other => println!("{}", serde_json::to_string_pretty(other)?),
            }
            Ok(if reported_failure(&value) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Resource { uri: Some(uri) } => {
            println!("{}", read_resource(ctx, &uri).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Resource { uri: None } => {
            for resource in list_resources() {
                println!("{:<26} {}", resource.uri, resource.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve::serve(registry, ctx, stdin, tokio::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_input(raw: Option<&str>) -> Result<Value, CliError> {
    match raw {
        Some(raw) => serde_json::from_str(raw).map_err(CliError::InputJson),
        None => Ok(Value::Null),
    }
}

/// True when the tool reported `success: false`; the process then exits non-zero.
fn reported_failure(result: &Value) -> bool {
    matches!(result.get("success"), Some(Value::Bool(false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_with_input() {
        let cli = Cli::try_parse_from([
            "dbmigrate",
            "--migrations-dir",
            "db/migrations",
            "call",
            "apply_migration",
            "--input",
            r#"{"version":"001"}"#,
        ])
        .unwrap();

        assert_eq!(cli.migrations_dir, Some(PathBuf::from("db/migrations")));
        match cli.command {
            Command::Call { tool, input } => {
                assert_eq!(tool, "apply_migration");
                assert_eq!(input.as_deref(), Some(r#"{"version":"001"}"#));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dbmigrate", "serve", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["dbmigrate"]).is_err());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(None).unwrap(), Value::Null);
        assert_eq!(
            parse_input(Some(r#"{"dry_run": true}"#)).unwrap(),
            serde_json::json!({ "dry_run": true })
        );
        assert!(matches!(
            parse_input(Some("{oops")),
            Err(CliError::InputJson(_))
        ));
    }

    #[test]
    fn test_reported_failure_follows_success_flag() {
        assert!(reported_failure(&serde_json::json!({ "success": false })));
        assert!(!reported_failure(&serde_json::json!({ "success": true })));
        assert!(!reported_failure(&serde_json::json!([])));
        assert!(!reported_failure(&Value::String("text".into())));
    }

    #[test]
    fn test_migrations_dir_flag_overrides_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let env_file = dir.path().join("test.env");
        std::fs::write(&env_file, "DBMIGRATE_DB_TYPE=sqlite\n").unwrap();

        let cli = Cli::try_parse_from([
            "dbmigrate",
            "--env-file",
            env_file.to_str().unwrap(),
            "--migrations-dir",
            "elsewhere",
            "tools",
        ])
        .unwrap();

        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.migrations_dir, PathBuf::from("elsewhere"));
    }
}
