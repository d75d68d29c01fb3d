//! Apply tools

use crate::context::{respond, MigrationContext};
use crate::prelude::*;

/// Input for applying a single migration
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyMigrationInput {
    /// Version to apply (e.g. "001")
    pub version: String,

    /// Preview the script without executing it
    #[serde(default)]
    pub dry_run: bool,
}

/// Applies one migration and records it in the ledger
pub struct ApplyMigrationTool {
    ctx: MigrationContext,
}

impl ApplyMigrationTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for ApplyMigrationTool {
    type Input = ApplyMigrationInput;

    fn name(&self) -> &str {
        "apply_migration"
    }

    fn description(&self) -> &str {
        "Apply a specific migration by version. With dry_run, returns a preview of the \
         script without touching the database."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let ApplyMigrationInput { version, dry_run } = input;
        respond(
            self.ctx
                .run(move |engine| engine.apply(&version, dry_run))
                .await?,
        )
    }
}

/// Input for applying every pending migration
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ApplyAllPendingInput {
    /// Preview every pending script without executing any
    #[serde(default)]
    pub dry_run: bool,
}

/// Applies pending migrations in version order, stopping at the first failure
pub struct ApplyAllPendingTool {
    ctx: MigrationContext,
}

impl ApplyAllPendingTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for ApplyAllPendingTool {
    type Input = ApplyAllPendingInput;

    fn name(&self) -> &str {
        "apply_all_pending"
    }

    fn description(&self) -> &str {
        "Apply all pending migrations in version order. Stops at the first failure; \
         migrations applied before it stay applied."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let dry_run = input.dry_run;
        respond(
            self.ctx
                .run(move |engine| engine.apply_all_pending(dry_run))
                .await?,
        )
    }
}
