//! Tool registry
//!
//! Snapshot of the tool server's tool list, fetched once per run.

use sdk::errors::EngineError;
use sdk::types::ToolDescriptor;
use tracing::{debug, warn};

use crate::mcp::ToolChannel;

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry from a tool list. Later duplicates of a name are
    /// dropped.
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        let mut unique: Vec<ToolDescriptor> = Vec::with_capacity(tools.len());
        for tool in tools {
            if unique.iter().any(|t| t.name == tool.name) {
                warn!("Tool server listed {} more than once; keeping the first", tool.name);
                continue;
            }
            unique.push(tool);
        }
        Self { tools: unique }
    }

    /// Query the channel for its tools.
    pub async fn fetch(channel: &dyn ToolChannel) -> Result<Self, EngineError> {
        let tools = channel.list_tools().await?;
        debug!("Retrieved {} tools", tools.len());
        Ok(Self::new(tools))
    }

    /// Look up a tool by exact name.
    pub fn find(&self, name: &str) -> Result<&ToolDescriptor, EngineError> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Numbered listing, one tool per line:
    /// `1. add(a: integer, b: integer) - Add two numbers`
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .enumerate()
            .map(|(i, tool)| format!("{}. {} - {}", i + 1, tool.signature(), tool.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
