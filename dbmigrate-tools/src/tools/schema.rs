//! Schema inspection tool

use crate::context::{respond, MigrationContext};
use crate::prelude::*;
use dbmigrate_core::TableSummary;

/// Input for schema inspection
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct InspectSchemaInput {
    /// Table to describe. Leave empty to list all tables.
    #[serde(default)]
    pub table: String,
}

#[derive(Debug, Serialize)]
struct TableList {
    tables: Vec<TableSummary>,
    table_count: usize,
}

/// Lists tables or describes one table's columns, row count and indexes
pub struct InspectSchemaTool {
    ctx: MigrationContext,
}

impl InspectSchemaTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for InspectSchemaTool {
    type Input = InspectSchemaInput;

    fn name(&self) -> &str {
        "inspect_schema"
    }

    fn description(&self) -> &str {
        "Inspect the database schema. With no table, lists every table and its column \
         count; with a table, returns its columns, row count and indexes."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let table = input.table.trim().to_string();
        if table.is_empty() {
            respond(
                self.ctx
                    .run(|engine| {
                        let tables = engine.list_tables()?;
                        Ok(TableList {
                            table_count: tables.len(),
                            tables,
                        })
                    })
                    .await?,
            )
        } else {
            respond(
                self.ctx
                    .run(move |engine| engine.inspect_table(&table))
                    .await?,
            )
        }
    }
}
