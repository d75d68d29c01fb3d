//! Read migration SQL tool

use crate::context::{failure, MigrationContext};
use crate::prelude::*;
use dbmigrate_core::{Direction, MigrateError};

/// Which script to read
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDirection {
    /// The apply script (`.up.sql`)
    #[default]
    Up,
    /// The rollback script (`.down.sql`)
    Down,
}

impl From<ScriptDirection> for Direction {
    fn from(direction: ScriptDirection) -> Self {
        match direction {
            ScriptDirection::Up => Direction::Up,
            ScriptDirection::Down => Direction::Down,
        }
    }
}

/// Input for reading a migration script
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadMigrationSqlInput {
    /// Version (e.g. "001") or full version (e.g. "001_initial")
    pub version: String,

    /// "up" for the apply script, "down" for the rollback script
    #[serde(default)]
    pub direction: ScriptDirection,
}

/// Returns the raw text of a migration script
pub struct ReadMigrationSqlTool {
    ctx: MigrationContext,
}

impl ReadMigrationSqlTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for ReadMigrationSqlTool {
    type Input = ReadMigrationSqlInput;

    fn name(&self) -> &str {
        "read_migration_sql"
    }

    fn description(&self) -> &str {
        "Read the raw SQL content of a migration file. Accepts a version ('001') or full \
         version ('001_initial'); direction is 'up' (default) or 'down'."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let direction = Direction::from(input.direction);
        let version = input.version;
        match self
            .ctx
            .run(move |engine| engine.read_sql(&version, direction))
            .await?
        {
            Ok(sql) => Ok(ToolResult::Text(sql)),
            Err(err @ MigrateError::NotFound(_)) => Ok(ToolResult::Text(err.to_string())),
            Err(MigrateError::RollbackFileMissing { path, .. }) => Ok(ToolResult::Text(format!(
                "File not found: {}",
                path.display()
            ))),
            Err(err) => failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, unwrap_text};
    use dbmigrate_core::test_utils::TestProject;

    fn input(version: &str, direction: ScriptDirection) -> ReadMigrationSqlInput {
        ReadMigrationSqlInput {
            version: version.to_string(),
            direction,
        }
    }

    #[tokio::test]
    async fn test_read_up_and_down() {
        let project = TestProject::new();
        project.write_migration(
            "001_users",
            "CREATE TABLE users (id INTEGER);",
            Some("DROP TABLE users;"),
        );
        let tool = ReadMigrationSqlTool::new(context(&project));

        let up = unwrap_text(tool.execute(input("001", ScriptDirection::Up)).await.unwrap());
        assert_eq!(up, "CREATE TABLE users (id INTEGER);");

        let down = unwrap_text(
            tool.execute(input("001_users", ScriptDirection::Down))
                .await
                .unwrap(),
        );
        assert_eq!(down, "DROP TABLE users;");
    }

    #[test]
    fn test_direction_defaults_to_up() {
        let parsed: ReadMigrationSqlInput =
            serde_json::from_value(serde_json::json!({ "version": "001" })).unwrap();
        assert!(matches!(parsed.direction, ScriptDirection::Up));
    }

    #[tokio::test]
    async fn test_unknown_version_is_text() {
        let project = TestProject::new();
        let tool = ReadMigrationSqlTool::new(context(&project));

        let text = unwrap_text(tool.execute(input("042", ScriptDirection::Up)).await.unwrap());
        assert_eq!(text, "Migration 042 not found");
    }

    #[tokio::test]
    async fn test_missing_down_is_text() {
        let project = TestProject::new();
        project.write_migration("001_users", "CREATE TABLE users (id INTEGER);", None);
        let tool = ReadMigrationSqlTool::new(context(&project));

        let text = unwrap_text(tool.execute(input("001", ScriptDirection::Down)).await.unwrap());
        assert!(text.starts_with("File not found: "));
        assert!(text.ends_with("001_users.down.sql"));
    }
}
