//! Line-delimited JSON request loop
//!
//! Each input line is one request:
//!
//! ```text
//! {"id": 1, "tool": "apply_migration", "input": {"version": "001"}}
//! {"id": 2, "resource": "migrations://status"}
//! ```
//!
//! and produces exactly one output line, `{"id", "result"}` or
//! `{"id", "error"}`. The `id` is echoed back unchanged (null when absent).
//! Blank lines are ignored and EOF ends the loop.

use crate::error::CliError;
use dbmigrate_tools::{read_resource, MigrationContext, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    input: Value,
    #[serde(default)]
    resource: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Result { id: Value, result: Value },
    Error { id: Value, error: String },
}

pub async fn serve<R, W>(
    registry: &ToolRegistry,
    ctx: &MigrationContext,
    reader: R,
    mut writer: W,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(tools = registry.len(), "serving requests on stdin");
    let mut lines = reader.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(registry, ctx, &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(requests = handled, "input closed");
    Ok(())
}

async fn handle_line(registry: &ToolRegistry, ctx: &MigrationContext, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            return Response::Error {
                id: Value::Null,
                error: format!("Invalid request: {err}"),
            }
        }
    };
    let id = request.id;

    match (request.tool, request.resource) {
        (Some(tool), None) => {
            debug!(tool = %tool, "tool request");
            match registry.execute(&tool, request.input).await {
                Ok(result) => Response::Result {
                    id,
                    result: result.into_value(),
                },
                Err(err) => Response::Error {
                    id,
                    error: err.to_string(),
                },
            }
        }
        (None, Some(uri)) => {
            debug!(uri = %uri, "resource request");
            match read_resource(ctx, &uri).await {
                Ok(text) => Response::Result {
                    id,
                    result: Value::String(text),
                },
                Err(err) => Response::Error {
                    id,
                    error: err.to_string(),
                },
            }
        }
        _ => Response::Error {
            id,
            error: "Invalid request: expected exactly one of \"tool\" or \"resource\"".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmigrate_core::test_utils::TestProject;
    use dbmigrate_tools::all_tools;
    use dbmigrate_tools::test_utils::context;

    async fn run(project: &TestProject, input: &str) -> Vec<Value> {
        let ctx = context(project);
        let registry = ToolRegistry::with_tools(all_tools(&ctx));
        let mut output = Vec::new();

        serve(&registry, &ctx, input.as_bytes(), &mut output)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_tool_requests() {
        let project = TestProject::new();
        project.write_migration("001_users", "CREATE TABLE users (id INTEGER);", None);

        let responses = run(
            &project,
            concat!(
                r#"{"id": 1, "tool": "apply_migration", "input": {"version": "001"}}"#,
                "\n\n",
                r#"{"id": "two", "tool": "apply_migration", "input": {"version": "001"}}"#,
                "\n",
            ),
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["success"], true);
        assert_eq!(responses[1]["id"], "two");
        assert_eq!(responses[1]["result"]["kind"], "already_applied");
        assert!(project.table_exists("users"));
    }

    #[tokio::test]
    async fn test_resource_request() {
        let project = TestProject::new();
        let responses = run(&project, r#"{"resource": "migrations://status"}"#).await;

        assert!(responses[0]["id"].is_null());
        assert!(responses[0]["result"]
            .as_str()
            .unwrap()
            .starts_with("DATABASE MIGRATION STATUS"));
    }

    #[tokio::test]
    async fn test_text_result_is_a_json_string() {
        let project = TestProject::new();
        project.write_migration("001_users", "CREATE TABLE users (id INTEGER);", None);

        let responses = run(
            &project,
            r#"{"id": 7, "tool": "read_migration_sql", "input": {"version": "001"}}"#,
        )
        .await;
        assert_eq!(responses[0]["result"], "CREATE TABLE users (id INTEGER);");
    }

    #[tokio::test]
    async fn test_errors_keep_the_loop_running() {
        let project = TestProject::new();

        let responses = run(
            &project,
            concat!(
                "not json\n",
                r#"{"id": 2, "tool": "no_such_tool"}"#,
                "\n",
                r#"{"id": 3}"#,
                "\n",
                r#"{"id": 4, "resource": "migrations://elsewhere"}"#,
                "\n",
                r#"{"id": 5, "tool": "migration_status"}"#,
                "\n",
            ),
        )
        .await;

        assert_eq!(responses.len(), 5);
        assert!(responses[0]["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request:"));
        assert_eq!(responses[1]["error"], "Unknown tool: no_such_tool");
        assert_eq!(responses[2]["id"], 3);
        assert!(responses[2]["error"].is_string());
        assert_eq!(
            responses[3]["error"],
            "Invalid input: Unknown resource: migrations://elsewhere"
        );
        assert_eq!(responses[4]["result"]["success"], true);
    }
}
