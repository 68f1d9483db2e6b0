//! JSON-RPC 2.0 method dispatch.
//!
//! Handlers are async and receive a [`RequestContext`] whose cancellation token
//! fires when the client withdraws the request.
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_ask_human::mcp::jsonrpc::{JsonRpcHandler, RequestContext};
//! use mcp_ask_human::mcp::types::JsonRpcRequest;
//!
//! async fn example() {
//!     let handler = JsonRpcHandler::new();
//!
//!     handler
//!         .register_method("echo", |params, _ctx| async move {
//!             Ok(params.unwrap_or(serde_json::Value::Null))
//!         })
//!         .await;
//!
//!     let request = JsonRpcRequest::new("echo", Some(serde_json::json!("hi")), serde_json::json!(1));
//!     let response = handler.handle_request(request, RequestContext::default()).await;
//!     println!("Result: {:?}", response.result);
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::mcp::types::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};
use crate::telemetry;
use crate::utils::error::{McpError, McpResult};

/// Per-request state handed to method handlers
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
}

impl RequestContext {
    /// Create a context around `cancel`
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Token that fires when the request is cancelled
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the request has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Async handler for a JSON-RPC method
pub type MethodHandler =
    Arc<dyn Fn(Option<Value>, RequestContext) -> BoxFuture<'static, McpResult<Value>> + Send + Sync>;

/// Handler for a JSON-RPC notification
pub type NotificationHandler = Arc<dyn Fn(Option<Value>) -> McpResult<()> + Send + Sync>;

/// JSON-RPC method and notification registry.
///
/// Handlers are looked up under a read lock and invoked after the lock is
/// released, so long-running calls never block registration or each other.
#[derive(Clone, Default)]
pub struct JsonRpcHandler {
    methods: Arc<RwLock<HashMap<String, MethodHandler>>>,
    notification_handlers: Arc<RwLock<HashMap<String, NotificationHandler>>>,
}

impl std::fmt::Debug for JsonRpcHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcHandler")
            .field(
                "methods_count",
                &self.methods.try_read().map(|m| m.len()).unwrap_or(0),
            )
            .field(
                "notification_handlers_count",
                &self.notification_handlers.try_read().map(|h| h.len()).unwrap_or(0),
            )
            .finish()
    }
}

impl JsonRpcHandler {
    /// Creates a handler with no registrations
    pub fn new() -> Self {
        debug!("Creating new JSON-RPC handler");
        Self::default()
    }

    /// Registers an async method handler, replacing any previous one
    #[instrument(skip(self, handler), fields(method = %name))]
    pub async fn register_method<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(Option<Value>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        let handler: MethodHandler = Arc::new(move |params, ctx| handler(params, ctx).boxed());
        self.methods.write().await.insert(name.to_string(), handler);
        debug!("Registered method handler for '{}'", name);
    }

    /// Registers a notification handler, replacing any previous one
    #[instrument(skip(self, handler), fields(method = %name))]
    pub async fn register_notification<F>(&self, name: &str, handler: F)
    where
        F: Fn(Option<Value>) -> McpResult<()> + Send + Sync + 'static,
    {
        self.notification_handlers
            .write()
            .await
            .insert(name.to_string(), Arc::new(handler));
        debug!("Registered notification handler for '{}'", name);
    }

    /// Names of registered methods
    pub async fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Handles a request. Failures become JSON-RPC error responses.
    #[instrument(skip(self, request, ctx), fields(method = %request.method, id = ?request.id))]
    pub async fn handle_request(&self, request: JsonRpcRequest, ctx: RequestContext) -> JsonRpcResponse {
        let _guard = telemetry::span_duration("handle_jsonrpc_request");

        if request.jsonrpc != JSONRPC_VERSION {
            warn!("Invalid JSON-RPC version: {}", request.jsonrpc);
            return JsonRpcResponse::error(
                JsonRpcError::invalid_request("Invalid JSON-RPC version"),
                request.id,
            );
        }

        let handler = self.methods.read().await.get(&request.method).cloned();
        let Some(handler) = handler else {
            warn!("Method not found: {}", request.method);
            let error = McpError::MethodNotFound(request.method.clone());
            return JsonRpcResponse::error(JsonRpcError::from(&error), request.id);
        };

        match handler(request.params, ctx).await {
            Ok(result) => {
                debug!("Method call successful: {}", request.method);
                JsonRpcResponse::success(result, request.id)
            }
            Err(error) => {
                warn!("Method call failed: {}: {}", request.method, error);
                JsonRpcResponse::error(JsonRpcError::from(&error), request.id)
            }
        }
    }

    /// Handles a notification. Unknown notifications are ignored.
    #[instrument(skip(self, notification), fields(method = %notification.method))]
    pub async fn handle_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        if notification.jsonrpc != JSONRPC_VERSION {
            warn!("Invalid JSON-RPC version in notification: {}", notification.jsonrpc);
            return Err(McpError::InvalidMessage(format!(
                "Invalid JSON-RPC version: {}",
                notification.jsonrpc
            )));
        }

        let handler = self
            .notification_handlers
            .read()
            .await
            .get(&notification.method)
            .cloned();

        match handler {
            Some(handler) => handler(notification.params),
            None => {
                debug!("No handler for notification method: {}", notification.method);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_register_and_handle_method() {
        let handler = JsonRpcHandler::new();
        handler
            .register_method("test.method", |params, _ctx| async move {
                match params {
                    Some(Value::Object(obj)) if obj.contains_key("echo") => Ok(obj["echo"].clone()),
                    _ => Ok(json!("default")),
                }
            })
            .await;

        let request = JsonRpcRequest::new("test.method", Some(json!({ "echo": "hello world" })), json!("1"));
        let response = handler.handle_request(request, RequestContext::default()).await;

        assert_eq!(response.jsonrpc, "2.0");
        assert_eq!(response.id, json!("1"));
        assert!(response.error.is_none());
        assert_eq!(response.result, Some(json!("hello world")));
        assert_eq!(handler.method_names().await, vec!["test.method"]);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let handler = JsonRpcHandler::new();
        let request = JsonRpcRequest::new("nonexistent.method", None, json!(1));
        let response = handler.handle_request(request, RequestContext::default()).await;

        assert_eq!(response.result, None);
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_version_and_handler_errors() {
        let handler = JsonRpcHandler::new();
        handler
            .register_method("params", |_, _| async { Err(McpError::InvalidParams("nope".into())) })
            .await;
        handler
            .register_method("boom", |_, _| async { Err(McpError::Execution("boom".into())) })
            .await;

        let mut request = JsonRpcRequest::new("params", None, json!(1));
        request.jsonrpc = "1.0".to_string();
        let response = handler.handle_request(request, RequestContext::default()).await;
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);

        let request = JsonRpcRequest::new("params", None, json!(2));
        let response = handler.handle_request(request, RequestContext::default()).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let request = JsonRpcRequest::new("boom", None, json!(3));
        let response = handler.handle_request(request, RequestContext::default()).await;
        assert_eq!(response.error.unwrap().code, INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_handler_sees_cancellation() {
        let handler = JsonRpcHandler::new();
        handler
            .register_method("wait", |_, ctx| async move {
                ctx.cancellation_token().cancelled().await;
                Ok(json!("cancelled"))
            })
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let request = JsonRpcRequest::new("wait", None, json!(1));
        let response = handler.handle_request(request, RequestContext::new(token)).await;
        assert_eq!(response.result, Some(json!("cancelled")));
    }

    #[tokio::test]
    async fn test_notifications() {
        let handler = JsonRpcHandler::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        handler
            .register_notification("note", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        handler
            .handle_notification(JsonRpcNotification::new("note", None))
            .await
            .unwrap();
        handler
            .handle_notification(JsonRpcNotification::new("unknown", None))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let mut bad = JsonRpcNotification::new("note", None);
        bad.jsonrpc = "1.0".to_string();
        assert!(handler.handle_notification(bad).await.is_err());
    }
}
