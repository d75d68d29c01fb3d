//! Connection test tool

use crate::context::{respond, MigrationContext};
use crate::prelude::*;
use dbmigrate_core::Backend;

/// Input for testing the database connection
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TestConnectionInput {}

#[derive(Debug, Serialize)]
struct ConnectionOk {
    message: &'static str,
    backend: Backend,
}

/// Opens a connection and runs `SELECT 1`
pub struct TestConnectionTool {
    ctx: MigrationContext,
}

impl TestConnectionTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for TestConnectionTool {
    type Input = TestConnectionInput;

    fn name(&self) -> &str {
        "test_connection"
    }

    fn description(&self) -> &str {
        "Test the database connection. Returns success or the driver's error message."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        let result = self
            .ctx
            .run(|engine| {
                engine.test_connection()?;
                Ok(ConnectionOk {
                    message: "Connection successful",
                    backend: engine.backend(),
                })
            })
            .await?;
        respond(result)
    }
}
