//! Name-based tool dispatch

use crate::tool::{box_tool, DynTool, Tool, ToolError, ToolResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Metadata describing a registered tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// An ordered set of tools addressable by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(tools: Vec<Box<dyn DynTool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Add a boxed tool.
    ///
    /// A tool whose name is already registered is still added, but lookups
    /// resolve to the first registration.
    pub fn register(&mut self, tool: Box<dyn DynTool>) {
        if self.get(tool.name()).is_some() {
            warn!(
                tool = tool.name(),
                "tool is already registered; calls will reach the first registration"
            );
        }
        self.tools.push(tool);
    }

    pub fn add_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.register(box_tool(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all registered tools
    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name with raw JSON input.
    ///
    /// A `null` input is treated as an empty object.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let input = match input {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => input,
            other => {
                return Err(ToolError::InvalidInput(format!(
                    "expected a JSON object, got {other}"
                )))
            }
        };

        debug!(tool = name, "executing tool");
        tool.execute_raw(input).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
