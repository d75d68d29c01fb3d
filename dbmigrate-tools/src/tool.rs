use dbmigrate_core::MigrateError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Output of a tool call: prose for prompts and scripts, JSON for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolResult {
    Text(String),
    Json(Value),
}

impl ToolResult {
    pub fn json<T: Serialize>(payload: T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(payload).map(ToolResult::Json)
    }

    /// Flatten into one JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            ToolResult::Text(text) => Value::String(text),
            ToolResult::Json(value) => value,
        }
    }
}

impl From<String> for ToolResult {
    fn from(text: String) -> Self {
        ToolResult::Text(text)
    }
}

/// A tool call that could not produce a result.
///
/// Migration failures are not tool errors; tools report them as a JSON
/// result with `success: false`. These variants cover bad input and
/// problems running the tool itself.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Migration(#[from] MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A named operation with a typed input whose JSON schema is derived.
///
/// # Example
///
/// ```rust
/// use dbmigrate_tools::{Tool, ToolError, ToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct GreetInput {
///     /// Who to greet
///     name: String,
/// }
///
/// struct GreetTool;
///
/// impl Tool for GreetTool {
///     type Input = GreetInput;
///
///     fn name(&self) -> &str { "greet" }
///     fn description(&self) -> &str { "Say hello" }
///
///     async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
///         Ok(format!("hello, {}", input.name).into())
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    type Input: DeserializeOwned + JsonSchema;

    /// Stable snake_case identifier used for dispatch, e.g. `apply_migration`
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn execute(&self, input: Self::Input)
        -> impl Future<Output = Result<ToolResult, ToolError>> + Send;

    /// JSON schema of `Input`; doc comments on its fields become descriptions.
    fn input_schema(&self) -> Value {
        schemars::schema_for!(Self::Input).into()
    }
}

pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + 'a>>;

/// Object-safe view of a [`Tool`] taking raw JSON input.
///
/// Obtain one with [`box_tool`] rather than implementing it directly.
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    fn execute_raw(&self, input: Value) -> BoxFuture<'_>;
}

/// Erase a tool's input type so tools can share one collection.
pub fn box_tool<T: Tool + 'static>(tool: T) -> Box<dyn DynTool> {
    Box::new(Erased(tool))
}

struct Erased<T>(T);

impl<T: Tool + 'static> DynTool for Erased<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn input_schema(&self) -> Value {
        self.0.input_schema()
    }

    fn execute_raw(&self, input: Value) -> BoxFuture<'_> {
        Box::pin(async move {
            let input: T::Input = serde_json::from_value(input).map_err(|e| {
                ToolError::InvalidInput(format!("Failed to deserialize input: {e}"))
            })?;
            self.0.execute(input).await
        })
    }
}
