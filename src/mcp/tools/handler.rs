use crate::mcp::jsonrpc::{JsonRpcHandler, RequestContext};
use crate::mcp::tools::models::{Tool, ToolResult};
use crate::utils::error::{McpError, McpResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Request parameters for listing tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsParams {
    /// Optional cursor for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Response for listing tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResponse {
    /// List of available tools
    pub tools: Vec<Tool>,

    /// Optional cursor for fetching next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Request parameters for calling a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: Value,
}

/// Source of tools for the `tools/*` methods
#[async_trait]
pub trait ToolsProvider: Send + Sync {
    /// Lists available tools
    async fn list_tools(&self, cursor: Option<&str>) -> McpResult<ListToolsResponse>;

    /// Calls a tool. `ctx` carries the caller's cancellation signal.
    async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
        ctx: &RequestContext,
    ) -> McpResult<ToolResult>;
}

/// Tools capabilities advertised in `initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapabilities {
    /// Whether the server notifies clients when the tool list changes
    #[serde(default)]
    pub list_changed: bool,
}

/// Binds a [`ToolsProvider`] to the `tools/list` and `tools/call` methods
#[derive(Clone)]
pub struct ToolsHandler {
    provider: Arc<dyn ToolsProvider>,
    capabilities: ToolsCapabilities,
}

impl fmt::Debug for ToolsHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsHandler")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl ToolsHandler {
    /// Creates a handler for `provider`. The tool list is static.
    pub fn new(provider: Arc<dyn ToolsProvider>) -> Self {
        Self {
            provider,
            capabilities: ToolsCapabilities::default(),
        }
    }

    /// Returns the capabilities of this handler
    pub fn capabilities(&self) -> &ToolsCapabilities {
        &self.capabilities
    }

    /// Registers `tools/list` and `tools/call` with the JSON-RPC handler
    pub async fn register_methods(&self, method_handler: &JsonRpcHandler) {
        let list_provider = self.provider.clone();
        method_handler
            .register_method("tools/list", move |params, _ctx| {
                let list_provider = list_provider.clone();
                async move {
                    let params: ListToolsParams = match params {
                        Some(value) if !value.is_null() => serde_json::from_value(value)
                            .map_err(|e| McpError::InvalidParams(e.to_string()))?,
                        _ => ListToolsParams::default(),
                    };
                    let response = list_provider.list_tools(params.cursor.as_deref()).await?;
                    Ok::<_, McpError>(serde_json::to_value(response)?)
                }
            })
            .await;

        let call_provider = self.provider.clone();
        method_handler
            .register_method("tools/call", move |params, ctx| {
                let call_provider = call_provider.clone();
                async move {
                    let params: CallToolParams =
                        serde_json::from_value(params.unwrap_or(Value::Null))
                            .map_err(|e| McpError::InvalidParams(e.to_string()))?;
                    let result = call_provider
                        .call_tool(&params.name, &params.arguments, &ctx)
                        .await?;
                    Ok::<_, McpError>(serde_json::to_value(result)?)
                }
            })
            .await;
    }
}
