use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::human_input::{HumanExchange, HumanInputRequest};
use crate::mcp::jsonrpc::RequestContext;
use crate::mcp::tools::handler::{ListToolsResponse, ToolsProvider};
use crate::mcp::tools::models::{Tool, ToolResult};
use crate::utils::error::{McpError, McpResult};

/// Name of the tool
pub const ASK_USER_TOOL_NAME: &str = "ask_user";

const DESCRIPTION: &str = "Ask the human user one or more questions and wait for the answers. \
A terminal window opens on the user's machine showing the reason and the numbered questions. \
The user has 10 minutes to answer. Use this when a decision or piece of information can only \
come from the user.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AskUserArgs {
    reason: String,
    questions: Vec<String>,
}

/// Provides the `ask_user` tool backed by a [`HumanExchange`]
#[derive(Debug, Clone)]
pub struct AskUserTool {
    exchange: HumanExchange,
}

impl Default for AskUserTool {
    fn default() -> Self {
        Self::new(HumanExchange::for_host())
    }
}

impl AskUserTool {
    /// Create the tool around `exchange`
    pub fn new(exchange: HumanExchange) -> Self {
        Self { exchange }
    }

    /// Tool definition advertised by `tools/list`
    pub fn definition() -> Tool {
        Tool::new(
            ASK_USER_TOOL_NAME,
            DESCRIPTION,
            json!({
                "type": "object",
                "properties": {
                    "reason": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Why the user's input is needed"
                    },
                    "questions": {
                        "type": "array",
                        "minItems": 1,
                        "items": { "type": "string", "minLength": 1 },
                        "description": "Questions to ask, answered in order"
                    }
                },
                "required": ["reason", "questions"],
                "additionalProperties": false
            }),
        )
    }

    /// Run one exchange for `arguments`
    pub async fn ask(&self, arguments: &Value, ctx: &RequestContext) -> ToolResult {
        let args: AskUserArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "Invalid ask_user arguments");
                return ToolResult::error(&format!(
                    "Invalid arguments for ask_user: {}. Expected {{\"reason\": string, \"questions\": [string, ...]}}.",
                    e
                ));
            }
        };

        let request = HumanInputRequest::new(args.reason, args.questions);
        info!(questions = request.len(), "Asking the user");
        let text = self.exchange.ask(&request, ctx.cancellation_token()).await;
        ToolResult::text(&text)
    }
}

#[async_trait]
impl ToolsProvider for AskUserTool {
    async fn list_tools(&self, _cursor: Option<&str>) -> McpResult<ListToolsResponse> {
        Ok(ListToolsResponse {
            tools: vec![Self::definition()],
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
        ctx: &RequestContext,
    ) -> McpResult<ToolResult> {
        if name != ASK_USER_TOOL_NAME {
            return Err(McpError::NotFound(format!("Tool '{}' not found", name)));
        }
        Ok(self.ask(arguments, ctx).await)
    }
}
