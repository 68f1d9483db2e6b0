//! Line-delimited JSON-RPC server for the MCP stdio transport.
//!
//! Each line read is one message. Requests run on their own tasks so a pending
//! `ask_user` call never blocks `ping` or the `notifications/cancelled` that
//! withdraws it. Responses go through a single writer task so lines never
//! interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::mcp::jsonrpc::{JsonRpcHandler, RequestContext};
use crate::mcp::tools::{ToolsHandler, ToolsProvider};
use crate::mcp::types::{JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse};
use crate::utils::error::{McpError, McpResult};

/// Protocol revision offered when the client does not ask for one
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "mcp-ask-human";

/// Token of a running request. `generation` tells a reused id apart from the
/// call that first used it.
#[derive(Debug)]
struct InFlightCall {
    generation: u64,
    token: CancellationToken,
}

type InFlight = Arc<Mutex<HashMap<String, InFlightCall>>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelledParams {
    request_id: Value,
    #[serde(default)]
    reason: Option<String>,
}

/// MCP server hosting a set of tools
#[derive(Debug, Clone)]
pub struct McpServer {
    handler: JsonRpcHandler,
    in_flight: InFlight,
    generations: Arc<AtomicU64>,
}

impl McpServer {
    /// Build a server exposing the tools of `provider`
    pub async fn new(provider: Arc<dyn ToolsProvider>) -> Self {
        let handler = JsonRpcHandler::new();
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

        let tools = ToolsHandler::new(provider);
        let capabilities = json!({ "tools": tools.capabilities() });
        tools.register_methods(&handler).await;

        handler
            .register_method("initialize", move |params, _ctx| {
                let capabilities = capabilities.clone();
                async move {
                    let version = params
                        .as_ref()
                        .and_then(|p| p.get("protocolVersion"))
                        .and_then(Value::as_str)
                        .unwrap_or(PROTOCOL_VERSION)
                        .to_string();
                    Ok(json!({
                        "protocolVersion": version,
                        "capabilities": capabilities,
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION"),
                        }
                    }))
                }
            })
            .await;

        handler
            .register_method("ping", |_params, _ctx| async { Ok(json!({})) })
            .await;

        handler
            .register_notification("notifications/initialized", |_params| {
                debug!("Client initialized");
                Ok(())
            })
            .await;

        let cancel_map = in_flight.clone();
        handler
            .register_notification("notifications/cancelled", move |params| {
                let params: CancelledParams =
                    serde_json::from_value(params.unwrap_or(Value::Null))
                        .map_err(|e| McpError::InvalidParams(e.to_string()))?;
                let key = request_key(&params.request_id);
                match lock(&cancel_map).get(&key) {
                    Some(call) => {
                        info!(request_id = %key, reason = ?params.reason, "Cancelling request");
                        call.token.cancel();
                    }
                    None => debug!(request_id = %key, "Cancellation for unknown request"),
                }
                Ok(())
            })
            .await;

        Self {
            handler,
            in_flight,
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The underlying method registry
    pub fn handler(&self) -> &JsonRpcHandler {
        &self.handler
    }

    /// Number of requests currently being processed
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Serve until `reader` reaches EOF and every in-flight request has been answered.
    ///
    /// Lines are read as raw bytes, so a line that is not valid UTF-8 is answered
    /// with a parse error instead of ending the session.
    #[instrument(skip_all)]
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(mut line) = rx.recv().await {
                line.push(b'\n');
                writer.write_all(&line).await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        info!("MCP server listening");
        let mut calls = JoinSet::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            reap(&mut calls);

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match JsonRpcMessage::from_slice(line) {
                Ok(JsonRpcMessage::Request(request)) => self.dispatch(request, &tx, &mut calls),
                Ok(JsonRpcMessage::Notification(notification)) => {
                    if let Err(e) = self.handler.handle_notification(notification).await {
                        warn!(error = %e, "Notification failed");
                    }
                }
                Err(McpError::Serialization(e)) => {
                    warn!(error = %e, "Unparseable message");
                    let error = JsonRpcError::parse_error(&format!("Parse error: {}", e));
                    send(&tx, &JsonRpcResponse::error(error, Value::Null));
                }
                Err(e) => {
                    warn!(error = %e, "Invalid message");
                    let id = JsonRpcMessage::id_of(line);
                    send(&tx, &JsonRpcResponse::error(JsonRpcError::from(&e), id));
                }
            }
        }

        debug!(pending = calls.len(), "Input closed, waiting for in-flight requests");
        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Request task failed");
            }
        }

        drop(tx);
        match writer_task.await {
            Ok(result) => result?,
            Err(e) => return Err(McpError::Execution(format!("writer task failed: {}", e))),
        }
        info!("MCP server stopped");
        Ok(())
    }

    fn dispatch(
        &self,
        request: JsonRpcRequest,
        tx: &mpsc::UnboundedSender<Vec<u8>>,
        calls: &mut JoinSet<()>,
    ) {
        let key = request_key(&request.id);
        let token = CancellationToken::new();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let previous = lock(&self.in_flight).insert(
            key.clone(),
            InFlightCall {
                generation,
                token: token.clone(),
            },
        );
        if previous.is_some() {
            warn!(request_id = %key, "Request id reused while still in flight");
        }

        let handler = self.handler.clone();
        let in_flight = self.in_flight.clone();
        let tx = tx.clone();
        calls.spawn(async move {
            let response = handler.handle_request(request, RequestContext::new(token)).await;
            {
                let mut map = lock(&in_flight);
                if map.get(&key).is_some_and(|call| call.generation == generation) {
                    map.remove(&key);
                }
            }
            send(&tx, &response);
        });
    }
}

/// Collect request tasks that already finished so a long session does not
/// accumulate them.
fn reap(calls: &mut JoinSet<()>) {
    while let Some(joined) = calls.try_join_next() {
        if let Err(e) = joined {
            error!(error = %e, "Request task failed");
        }
    }
}

/// Map key for a request id. Numbers and strings stay distinct.
fn request_key(id: &Value) -> String {
    id.to_string()
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, InFlightCall>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

fn send(tx: &mpsc::UnboundedSender<Vec<u8>>, response: &JsonRpcResponse) {
    match response.to_bytes() {
        Ok(bytes) => {
            if tx.send(bytes).is_err() {
                debug!(id = ?response.id, "Output closed, dropping response");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize response"),
    }
}
