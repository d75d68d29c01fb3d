//! Read-only query tool

use crate::context::{respond, MigrationContext};
use crate::prelude::*;

/// Input for a read-only query
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunQueryInput {
    /// SQL SELECT query to execute
    pub query: String,
}

/// Executes an inspection query; write keywords are refused
pub struct RunQueryTool {
    ctx: MigrationContext,
}

impl RunQueryTool {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }
}

impl Tool for RunQueryTool {
    type Input = RunQueryInput;

    fn name(&self) -> &str {
        "run_query"
    }

    fn description(&self) -> &str {
        "Execute a read-only SQL query for inspection. Queries containing DROP, DELETE, \
         UPDATE, INSERT, ALTER, TRUNCATE or CREATE are blocked; use migrations for changes."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let query = input.query;
        respond(self.ctx.run(move |engine| engine.run_query(&query)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context, unwrap_json};
    use dbmigrate_core::test_utils::TestProject;

    fn query(sql: &str) -> RunQueryInput {
        RunQueryInput {
            query: sql.to_string(),
        }
    }

    #[tokio::test]
    async fn test_select() {
        let project = TestProject::new();
        project.execute(
            "CREATE TABLE items (id INTEGER, label TEXT, payload BLOB);
             INSERT INTO items VALUES (1, 'one', x'ff'), (2, NULL, NULL);",
        );
        let tool = RunQueryTool::new(context(&project));

        let json = unwrap_json(
            tool.execute(query("SELECT id, label, payload FROM items ORDER BY id"))
                .await
                .unwrap(),
        );
        assert_eq!(json["success"], true);
        assert_eq!(json["columns"], serde_json::json!(["id", "label", "payload"]));
        assert_eq!(json["row_count"], 2);
        assert_eq!(json["rows"][0], serde_json::json!([1, "one", "/w=="]));
        assert_eq!(json["rows"][1], serde_json::json!([2, null, null]));
    }

    #[tokio::test]
    async fn test_select_one() {
        let project = TestProject::new();
        let tool = RunQueryTool::new(context(&project));

        let json = unwrap_json(tool.execute(query("SELECT 1")).await.unwrap());
        assert_eq!(json["columns"].as_array().unwrap().len(), 1);
        assert_eq!(json["rows"], serde_json::json!([[1]]));
    }

    #[tokio::test]
    async fn test_blocked_keywords() {
        let project = TestProject::new();
        project.execute("CREATE TABLE x (id INTEGER);");
        let tool = RunQueryTool::new(context(&project));

        let json = unwrap_json(tool.execute(query("drop table x")).await.unwrap());
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "safety_blocked");
        assert_eq!(
            json["error"],
            "Safety block: 'DROP' statements not allowed. Use migrations for schema changes."
        );
        assert!(project.table_exists("x"));

        let json = unwrap_json(
            tool.execute(query("Insert into x values (1)"))
                .await
                .unwrap(),
        );
        assert_eq!(json["kind"], "safety_blocked");
        assert_eq!(project.count("x"), 0);
    }

    #[tokio::test]
    async fn test_statement_without_result_set() {
        let project = TestProject::new();
        let tool = RunQueryTool::new(context(&project));

        let json = unwrap_json(tool.execute(query("PRAGMA user_version = 3")).await.unwrap());
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Query executed, no results returned");
    }

    #[tokio::test]
    async fn test_driver_error_reported() {
        let project = TestProject::new();
        let tool = RunQueryTool::new(context(&project));

        let json = unwrap_json(tool.execute(query("SELECT * FROM nowhere")).await.unwrap());
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "execution_failure");
        assert!(json["error"].as_str().unwrap().contains("no such table"));
    }
}
