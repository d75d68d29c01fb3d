//! Test utilities for migration tools
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{context, unwrap_json};
//! use dbmigrate_core::test_utils::TestProject;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let project = TestProject::new();
//!     let tool = MigrationStatusTool::new(context(&project));
//!
//!     let json = unwrap_json(tool.execute(Default::default()).await.unwrap());
//!     assert_eq!(json["success"], true);
//! }
//! ```

use crate::context::MigrationContext;
use crate::tool::ToolResult;
use dbmigrate_core::test_utils::TestProject;

/// Unwraps a `ToolResult::Json` variant, panicking with a clear message if it's not JSON.
pub fn unwrap_json(result: ToolResult) -> serde_json::Value {
    match result {
        ToolResult::Json(v) => v,
        other => panic!("Expected JSON result, got {:?}", other),
    }
}

/// Unwraps a `ToolResult::Text` variant, panicking with a clear message if it's not text.
pub fn unwrap_text(result: ToolResult) -> String {
    match result {
        ToolResult::Text(s) => s,
        other => panic!("Expected text result, got {:?}", other),
    }
}

/// A context over the project's engine.
pub fn context(project: &TestProject) -> MigrationContext {
    MigrationContext::new(project.engine().clone())
}
