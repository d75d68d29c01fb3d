//! Migration tools
//!
//! Every operation of the engine is exposed as a [`Tool`](crate::Tool) with a
//! JSON-schema input. Tools are split into read-only (safe) and mutative
//! (destructive) groups so a host can grant permissions per group.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dbmigrate_core::Settings;
//! use dbmigrate_tools::{tools, MigrationContext, ToolRegistry};
//!
//! let ctx = MigrationContext::from_settings(&Settings::from_env()?);
//!
//! // Inspection only
//! let registry = ToolRegistry::with_tools(tools::read_only_tools(&ctx));
//!
//! // Full access
//! let registry = ToolRegistry::with_tools(tools::all_tools(&ctx));
//! ```
//!
//! # Tool Groups
//!
//! | Function | Tools | Use Case |
//! |----------|-------|----------|
//! | [`read_only_tools()`] | 8 tools | Status, drift, schema and query inspection |
//! | [`mutative_tools()`] | 5 tools | Applying, rolling back and authoring migrations |
//! | [`all_tools()`] | 13 tools | Full migration management |
//!
//! # Tool Categories
//!
//! ## Inspection (Safe)
//! - `test_connection` - Verify the database is reachable
//! - `migration_status` - Applied, pending, drifted and missing migrations
//! - `list_pending_migrations` - Pending migrations in apply order
//! - `check_drift` - Applied migrations whose files changed
//! - `read_migration_sql` - Contents of an up or down script
//! - `inspect_schema` - Tables, columns and indexes
//! - `run_query` - Guarded read-only SQL
//! - `explain_migration` - Prompt describing a migration
//!
//! ## Execution (Destructive)
//! - `apply_migration` - Apply one migration
//! - `apply_all_pending` - Apply every pending migration in order
//! - `rollback_migration` - Roll back one migration
//! - `rollback_last` - Roll back the latest migration
//! - `create_migration` - Write new migration files

pub mod apply;
pub mod connection;
pub mod create;
pub mod explain;
pub mod query;
pub mod read_sql;
pub mod rollback;
pub mod schema;
pub mod status;

pub use apply::{ApplyAllPendingInput, ApplyAllPendingTool, ApplyMigrationInput, ApplyMigrationTool};
pub use connection::{TestConnectionInput, TestConnectionTool};
pub use create::{CreateMigrationInput, CreateMigrationTool};
pub use explain::{ExplainMigrationInput, ExplainMigrationTool};
pub use query::{RunQueryInput, RunQueryTool};
pub use read_sql::{ReadMigrationSqlInput, ReadMigrationSqlTool, ScriptDirection};
pub use rollback::{RollbackLastInput, RollbackLastTool, RollbackMigrationInput, RollbackMigrationTool};
pub use schema::{InspectSchemaInput, InspectSchemaTool};
pub use status::{
    CheckDriftInput, CheckDriftTool, ListPendingMigrationsInput, ListPendingMigrationsTool,
    MigrationStatusInput, MigrationStatusTool,
};

use crate::context::MigrationContext;
use crate::tool::{box_tool, DynTool};

/// Returns all read-only migration tools
///
/// These tools never change the database schema or the ledger.
pub fn read_only_tools(ctx: &MigrationContext) -> Vec<Box<dyn DynTool>> {
    vec![
        box_tool(TestConnectionTool::new(ctx.clone())),
        box_tool(MigrationStatusTool::new(ctx.clone())),
        box_tool(ListPendingMigrationsTool::new(ctx.clone())),
        box_tool(CheckDriftTool::new(ctx.clone())),
        box_tool(ReadMigrationSqlTool::new(ctx.clone())),
        box_tool(InspectSchemaTool::new(ctx.clone())),
        box_tool(RunQueryTool::new(ctx.clone())),
        box_tool(ExplainMigrationTool::new(ctx.clone())),
    ]
}

/// Returns all mutative migration tools
pub fn mutative_tools(ctx: &MigrationContext) -> Vec<Box<dyn DynTool>> {
    vec![
        box_tool(ApplyMigrationTool::new(ctx.clone())),
        box_tool(ApplyAllPendingTool::new(ctx.clone())),
        box_tool(RollbackMigrationTool::new(ctx.clone())),
        box_tool(RollbackLastTool::new(ctx.clone())),
        box_tool(CreateMigrationTool::new(ctx.clone())),
    ]
}

/// Returns all migration tools
pub fn all_tools(ctx: &MigrationContext) -> Vec<Box<dyn DynTool>> {
    let mut tools = read_only_tools(ctx);
    tools.extend(mutative_tools(ctx));
    tools
}
