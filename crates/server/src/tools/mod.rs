//! MCP tool implementations.
//!
//! Each lifecycle hook of the worker is exposed as one tool, plus a few
//! tools for inspecting the cache and queueing offline writes.

pub mod cache;
pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod outbox;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
