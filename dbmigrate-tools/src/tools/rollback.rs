//! Rollback tools

use crate::context::{respond, MigrationContext};
use crate::prelude::*;

/// Input for rolling back a single migration
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RollbackMigrationInput {
    /// Version to roll back (e.g. "001")
    pub version: String,

    /// Preview the rollback script without executing it
    #[serde(default)]
    pub dry_run: bool,
}

/// Runs a migration's `.down.sql` and removes its ledger row
pub struct RollbackMigrationTool {
    ctx: MigrationContext,
}

impl RollbackMigrationTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for RollbackMigrationTool {
    type Input = RollbackMigrationInput;

    fn name(&self) -> &str {
        "rollback_migration"
    }

    fn description(&self) -> &str {
        "Roll back a specific migration using its .down.sql file. The migration file stays \
         on disk and becomes pending again."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let RollbackMigrationInput { version, dry_run } = input;
        respond(
            self.ctx
                .run(move |engine| engine.rollback(&version, dry_run))
                .await?,
        )
    }
}

/// Input for rolling back the latest migration
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RollbackLastInput {}

/// Rolls back the highest applied version
pub struct RollbackLastTool {
    ctx: MigrationContext,
}

impl RollbackLastTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for RollbackLastTool {
    type Input = RollbackLastInput;

    fn name(&self) -> &str {
        "rollback_last"
    }

    fn description(&self) -> &str {
        "Roll back the most recently applied migration."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        respond(self.ctx.run(|engine| engine.rollback_last()).await?)
    }
}
