//! Read-only text resources
//!
//! Resources are addressed by URI and always return plain text, suitable for
//! pasting straight into a conversation.

use crate::context::MigrationContext;
use crate::tool::ToolError;
use serde::Serialize;

pub const STATUS_URI: &str = "migrations://status";
pub const SCHEMA_URI: &str = "migrations://schema";

/// Metadata for a readable resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn list_resources() -> Vec<ResourceInfo> {
    vec![
        ResourceInfo {
            uri: STATUS_URI,
            name: "Migration status",
            description: "Current migration status: applied, pending and drifted migrations",
        },
        ResourceInfo {
            uri: SCHEMA_URI,
            name: "Database schema",
            description: "DDL of every table in the database",
        },
    ]
}

/// Render the resource at `uri`.
pub async fn read_resource(ctx: &MigrationContext, uri: &str) -> Result<String, ToolError> {
    let text = match uri {
        STATUS_URI => ctx.run(|engine| engine.status_summary()).await?,
        SCHEMA_URI => ctx.run(|engine| engine.schema_text()).await?,
        other => {
            return Err(ToolError::InvalidInput(format!(
                "Unknown resource: {other}"
            )))
        }
    };
    Ok(text?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::context;
    use dbmigrate_core::test_utils::TestProject;

    #[tokio::test]
    async fn test_status_resource() {
        let project = TestProject::new();
        project.write_migration("001_init", "CREATE TABLE a (id INTEGER);", None);

        let text = read_resource(&context(&project), STATUS_URI).await.unwrap();
        assert!(text.contains("DATABASE MIGRATION STATUS"));
        assert!(text.contains("001_init"));
    }

    #[tokio::test]
    async fn test_schema_resource() {
        let project = TestProject::new();
        let ctx = context(&project);

        let text = read_resource(&ctx, SCHEMA_URI).await.unwrap();
        assert_eq!(text, "(No tables found)");

        project.execute("CREATE TABLE widgets (id INTEGER PRIMARY KEY);");
        let text = read_resource(&ctx, SCHEMA_URI).await.unwrap();
        assert!(text.contains("CREATE TABLE widgets"));
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let project = TestProject::new();
        let err = read_resource(&context(&project), "migrations://nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_list_resources() {
        let uris: Vec<&str> = list_resources().iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec![STATUS_URI, SCHEMA_URI]);
    }
}
