//! Create migration tool

use crate::context::{respond, MigrationContext};
use crate::prelude::*;

/// Input for authoring a new migration
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMigrationInput {
    /// Descriptive name (e.g. "add users table")
    pub name: String,

    /// SQL executed when the migration is applied
    pub up_sql: String,

    /// SQL executed on rollback (optional but recommended)
    #[serde(default)]
    pub down_sql: String,
}

/// Writes a new `.up.sql` (and optional `.down.sql`) with the next version number
pub struct CreateMigrationTool {
    ctx: MigrationContext,
}

impl CreateMigrationTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for CreateMigrationTool {
    type Input = CreateMigrationInput;

    fn name(&self) -> &str {
        "create_migration"
    }

    fn description(&self) -> &str {
        "Create a new migration file with an auto-generated version number. The database \
         is not touched; apply the migration separately."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let CreateMigrationInput {
            name,
            up_sql,
            down_sql,
        } = input;
        respond(
            self.ctx
                .run(move |engine| engine.create(&name, &up_sql, Some(&down_sql)))
                .await?,
        )
    }
}
