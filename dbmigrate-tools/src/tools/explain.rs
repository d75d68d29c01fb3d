//! Migration explanation prompt

use crate::context::{failure, MigrationContext};
use crate::prelude::*;

/// Input for the explanation prompt
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExplainMigrationInput {
    /// Version (e.g. "001") or full version (e.g. "001_initial")
    pub version: String,
}

/// Builds a prompt asking for an explanation of a migration's purpose and changes
pub struct ExplainMigrationTool {
    ctx: MigrationContext,
}

impl ExplainMigrationTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for ExplainMigrationTool {
    type Input = ExplainMigrationInput;

    fn name(&self) -> &str {
        "explain_migration"
    }

    fn description(&self) -> &str {
        "Generate a prompt that asks for an explanation of a migration: its status, up and \
         down SQL, schema changes and risks."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let version = input.version;
        match self.ctx.run(move |engine| engine.explain(&version)).await? {
            Ok(prompt) => Ok(ToolResult::Text(prompt)),
            Err(err) => failure(&err),
        }
    }
}
