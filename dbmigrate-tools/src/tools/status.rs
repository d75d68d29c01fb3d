//! Read-only status tools

use crate::context::{failure, respond, MigrationContext};
use crate::prelude::*;

/// Input for the migration status tool
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct MigrationStatusInput {}

/// Reports pending, applied and drifted migrations
pub struct MigrationStatusTool {
    ctx: MigrationContext,
}

impl MigrationStatusTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for MigrationStatusTool {
    type Input = MigrationStatusInput;

    fn name(&self) -> &str {
        "migration_status"
    }

    fn description(&self) -> &str {
        "Get detailed migration status: pending and applied migrations, the current version, \
         checksum drift, and applied versions whose files are missing."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        respond(self.ctx.run(|engine| engine.status()).await?)
    }
}

/// Input for listing pending migrations
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListPendingMigrationsInput {}

/// Lists migrations that have not been applied, in apply order
pub struct ListPendingMigrationsTool {
    ctx: MigrationContext,
}

impl ListPendingMigrationsTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for ListPendingMigrationsTool {
    type Input = ListPendingMigrationsInput;

    fn name(&self) -> &str {
        "list_pending_migrations"
    }

    fn description(&self) -> &str {
        "List all migrations that haven't been applied yet, with version, name and checksum."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        match self.ctx.run(|engine| engine.pending()).await? {
            Ok(pending) => Ok(ToolResult::json(pending)?),
            Err(err) => failure(&err),
        }
    }
}

/// Input for the drift check
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CheckDriftInput {}

/// Compares recorded checksums with the files on disk
pub struct CheckDriftTool {
    ctx: MigrationContext,
}

impl CheckDriftTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for CheckDriftTool {
    type Input = CheckDriftInput;

    fn name(&self) -> &str {
        "check_drift"
    }

    fn description(&self) -> &str {
        "Check for schema drift by comparing migration checksums. Detects migration files \
         that were modified after being applied."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        respond(self.ctx.run(|engine| engine.check_drift()).await?)
    }
}
