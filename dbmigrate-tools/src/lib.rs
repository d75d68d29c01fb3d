//! Tool surface for the dbmigrate migration engine
//!
//! Each engine operation is a [`Tool`] with a typed input whose JSON schema
//! is derived with `schemars`. Tools are boxed into [`DynTool`] so a host can
//! list them and dispatch calls by name through a [`ToolRegistry`].
//!
//! Migration failures (unknown versions, already-applied migrations, failing
//! SQL, blocked queries) come back as a JSON result with `success: false`
//! rather than as a [`ToolError`].

pub mod context;
pub mod registry;
pub mod resources;
pub mod tool;
pub mod tools;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use context::MigrationContext;
pub use registry::{ToolInfo, ToolRegistry};
pub use resources::{list_resources, read_resource, ResourceInfo, SCHEMA_URI, STATUS_URI};
pub use tool::{box_tool, DynTool, Tool, ToolError, ToolResult};

// Re-export tool grouping functions at crate root for convenience
pub use tools::{all_tools, mutative_tools, read_only_tools};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::tool::{Tool, ToolError, ToolResult};
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
}
