use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, Tool};
use rmcp::service::{Peer, RunningService, ServiceError};
use rmcp::transport::IntoTransport;
use rmcp::{RoleClient, ServiceExt};
use sdk::types::{ContentItem, ToolDescriptor, ToolResult};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ChannelError, ToolChannel};

impl From<ServiceError> for ChannelError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::McpError(error) => ChannelError::Rpc {
                code: i64::from(error.code.0),
                message: error.message.to_string(),
            },
            ServiceError::TransportClosed => ChannelError::Closed,
            other => ChannelError::Protocol(other.to_string()),
        }
    }
}

/// MCP client session.
///
/// The handshake runs in `connect`; server pings and notifications are
/// answered by the session itself. Every request is bounded by
/// `request_timeout` so a reply the session cannot match fails the call
/// instead of stalling the run.
pub struct McpClient {
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    request_timeout: Duration,
}

impl McpClient {
    /// Run the `initialize` handshake over `transport`.
    pub async fn connect<T, E, A>(transport: T, request_timeout: Duration) -> Result<Self, ChannelError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ChannelError::Protocol(format!("handshake failed: {}", e)))?;

        if let Some(info) = service.peer_info() {
            let server = &info.server_info;
            debug!("Connected to tool server {} {}", server.name, server.version);
        }

        Ok(Self {
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            request_timeout,
        })
    }

    /// Close the session. Later requests fail with `ChannelError::Closed`.
    pub async fn shutdown(&self) {
        if let Some(service) = self.service.lock().await.take() {
            if let Err(e) = service.cancel().await {
                warn!("Tool server session did not stop cleanly: {}", e);
            }
        }
    }

    async fn bounded<T, F>(&self, method: &str, request: F) -> Result<T, ChannelError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        debug!("-> {}", method);
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(outcome) => outcome.map_err(ChannelError::from),
            Err(_) => {
                warn!("{} got no reply within {:?}", method, self.request_timeout);
                Err(ChannelError::Timeout(self.request_timeout))
            }
        }
    }
}

#[async_trait]
impl ToolChannel for McpClient {
    async fn initialize(&self) -> Result<(), ChannelError> {
        match self.service.lock().await.as_ref() {
            Some(_) => Ok(()),
            None => Err(ChannelError::Closed),
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChannelError> {
        let tools = self
            .bounded("tools/list", self.peer.list_all_tools())
            .await?;
        Ok(tools.into_iter().map(descriptor).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolResult, ChannelError> {
        let params = CallToolRequestParams {
            meta: None,
            name: name.to_string().into(),
            arguments: Some(arguments),
            task: None,
        };
        let result = self
            .bounded("tools/call", self.peer.call_tool(params))
            .await?;

        let result = parse_call_result(serde_json::to_value(&result)?)?;
        debug!("<- tools/call {}: {}", name, result.to_text());
        Ok(result)
    }
}

fn descriptor(tool: Tool) -> ToolDescriptor {
    let schema = Value::Object(tool.input_schema.as_ref().clone());
    ToolDescriptor::from_input_schema(
        tool.name.to_string(),
        tool.description.map(|d| d.to_string()),
        &schema,
    )
}

/// Interpret a `tools/call` result in its wire form.
///
/// A `content` array becomes `ToolResult::Content`; anything else is kept
/// as an opaque value. `isError: true` is logged and the content is
/// returned like any other result, so the model sees the server's message.
pub fn parse_call_result(result: Value) -> Result<ToolResult, ChannelError> {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let tool_result = match result.get("content") {
        Some(Value::Array(items)) => {
            let items = items
                .iter()
                .cloned()
                .map(serde_json::from_value::<ContentItem>)
                .collect::<Result<Vec<_>, _>>()?;
            ToolResult::Content(items)
        }
        _ => ToolResult::Value(result),
    };

    if is_error {
        let text = tool_result.to_text();
        warn!("Tool server flagged its result as an error: {}", text);
    }
    Ok(tool_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_call_result() {
        let result = parse_call_result(json!({
            "content": [{"type": "text", "text": "5"}],
            "isError": false
        }))
        .unwrap();
        assert_eq!(result.to_text(), "[5]");

        let result = parse_call_result(json!({"structured": 5})).unwrap();
        assert_eq!(result, ToolResult::Value(json!({"structured": 5})));
    }

    #[test]
    fn test_error_flagged_result_is_still_a_result() {
        let result = parse_call_result(json!({
            "content": [{"type": "text", "text": "Error executing tool add: overflow"}],
            "isError": true
        }))
        .unwrap();
        assert_eq!(result.to_text(), "[Error executing tool add: overflow]");
    }

    #[test]
    fn test_descriptor_keeps_schema_order() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "add",
            "description": "Add two numbers",
            "inputSchema": {
                "type": "object",
                "properties": {"b": {"type": "integer"}, "a": {"type": "integer"}}
            }
        }))
        .unwrap();

        let descriptor = descriptor(tool);
        assert_eq!(descriptor.signature(), "add(b: integer, a: integer)");
        assert_eq!(descriptor.description, "Add two numbers");
    }
}
