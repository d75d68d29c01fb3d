//! Shared engine handle for tools
//!
//! One [`MigrationContext`] is built at startup and cloned into every tool.
//! Engine calls block on the filesystem and the database, so they run on
//! tokio's blocking pool.

use crate::tool::{ToolError, ToolResult};
use dbmigrate_core::{Failure, Flagged, MigrateError, MigrationEngine, Settings};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MigrationContext {
    engine: Arc<MigrationEngine>,
}

impl MigrationContext {
    pub fn new(engine: MigrationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(MigrationEngine::from_settings(settings))
    }

    pub fn engine(&self) -> &MigrationEngine {
        &self.engine
    }

    /// Run a blocking engine call off the async runtime.
    pub async fn run<T, F>(&self, f: F) -> Result<Result<T, MigrateError>, ToolError>
    where
        T: Send + 'static,
        F: FnOnce(&MigrationEngine) -> Result<T, MigrateError> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        Ok(tokio::task::spawn_blocking(move || f(&engine)).await?)
    }
}

/// Flat `{success: true, ..}` or `{success: false, kind, version?, error}` JSON.
///
/// `T` must serialize as a struct or map.
pub fn respond<T: Serialize>(result: Result<T, MigrateError>) -> Result<ToolResult, ToolError> {
    match result {
        Ok(payload) => Ok(ToolResult::json(Flagged::new(true, &payload))?),
        Err(err) => failure(&err),
    }
}

pub fn failure(err: &MigrateError) -> Result<ToolResult, ToolError> {
    let failure = Failure::from(err);
    Ok(ToolResult::json(Flagged::new(false, &failure))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::unwrap_json;
    use dbmigrate_core::test_utils::TestProject;

    #[derive(Serialize)]
    struct Payload {
        answer: i32,
    }

    #[test]
    fn test_respond_success_is_flat() {
        let json = unwrap_json(respond(Ok(Payload { answer: 42 })).unwrap());
        assert_eq!(json, serde_json::json!({ "success": true, "answer": 42 }));
    }

    #[test]
    fn test_respond_failure_shape() {
        let result: Result<Payload, _> = Err(MigrateError::NotFound("003".into()));
        let json = unwrap_json(respond(result).unwrap());
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "kind": "not_found",
                "version": "003",
                "error": "Migration 003 not found",
            })
        );
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let project = TestProject::new();
        let ctx = MigrationContext::new(project.engine().clone());

        let status = ctx.run(|engine| engine.status()).await.unwrap().unwrap();
        assert!(status.is_up_to_date());
    }
}
