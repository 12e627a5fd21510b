//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. A
//! connection that calls `subscribe_events` additionally receives matching
//! events as `event` notifications on the same socket.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use veil_types::{codes, ErrorCode};

use crate::commands;
use crate::events::{Event, EventFilter};
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC success response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Stable error name, e.g. `INSUFFICIENT_FUNDS`.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Server-to-client notification.
#[derive(Debug, Serialize)]
struct RpcNotification<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: &'a Event,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Map a component error onto its numeric code, keeping the stable
    /// error name as the message.
    pub fn domain<E>(err: E) -> Self
    where
        E: ErrorCode + std::fmt::Display,
    {
        let name = err.code();
        let code = match name {
            codes::VALIDATION_ERROR => -32001,
            codes::NOT_FOUND => -32004,
            codes::CONCURRENCY_CONFLICT => -32009,
            codes::SESSION_NOT_FOUND => -32020,
            codes::TARGET_HAS_NO_ANSWER => -32021,
            codes::SELF_INTERACTION_FORBIDDEN => -32022,
            codes::RATE_LIMITED => -32029,
            codes::INSUFFICIENT_FUNDS => -32040,
            _ => -32050,
        };
        if code == -32050 {
            warn!(error = %err, "rpc: storage failure");
        }
        Self {
            code,
            message: name.to_string(),
            data: Some(serde_json::json!({"detail": err.to_string()})),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Active event subscription of one connection.
struct Subscription {
    id: String,
    filter: EventFilter,
    receiver: broadcast::Receiver<Event>,
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<Event> {
    let sub = subscription.as_mut()?;
    loop {
        match sub.receiver.recv().await {
            Ok(event) if sub.filter.matches(&event) => return Some(event),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(subscription = %sub.id, skipped, "subscriber lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut subscription: Option<Subscription> = None;

    loop {
        let mut outgoing = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                let response = match serde_json::from_str::<RpcRequest>(&line) {
                    Ok(request) => {
                        handle_request(&state, request, &mut subscription).await
                    }
                    Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
                };
                serde_json::to_string(&response)?
            }
            Some(event) = next_event(&mut subscription) => {
                serde_json::to_string(&RpcNotification {
                    jsonrpc: "2.0",
                    method: "event",
                    params: &event,
                })?
            }
        };

        outgoing.push('\n');
        writer.write_all(outgoing.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Subscription bookkeeping happens here because it is per connection;
/// everything else goes through [`dispatch_request`].
async fn handle_request(
    state: &Arc<DaemonState>,
    request: RpcRequest,
    subscription: &mut Option<Subscription>,
) -> RpcResponse {
    match request.method.as_str() {
        "subscribe_events" => {
            let filter = match request.params.get("filter") {
                Some(raw) if !raw.is_null() => {
                    match serde_json::from_value::<EventFilter>(raw.clone()) {
                        Ok(filter) => filter,
                        Err(e) => {
                            return RpcResponse::error(
                                request.id,
                                RpcError::invalid_params(&format!("filter: {e}")),
                            )
                        }
                    }
                }
                _ => EventFilter::default(),
            };
            let id = commands::diagnostics::new_subscription_id();
            *subscription = Some(Subscription {
                id: id.clone(),
                filter,
                receiver: state.event_bus.subscribe(),
            });
            RpcResponse::success(
                request.id,
                serde_json::json!({
                    "subscription_id": id,
                    "sequence": state.event_bus.sequence(),
                }),
            )
        }
        "unsubscribe_events" => {
            let given = request.params.get("subscription_id").and_then(|v| v.as_str());
            match (subscription.as_ref(), given) {
                (_, None) => RpcResponse::error(
                    request.id,
                    RpcError::invalid_params("subscription_id required"),
                ),
                (Some(sub), Some(id)) if sub.id == id => {
                    *subscription = None;
                    RpcResponse::success(request.id, serde_json::json!({"unsubscribed": true}))
                }
                _ => RpcResponse::success(request.id, serde_json::json!({"unsubscribed": false})),
            }
        }
        _ => dispatch_request(state.clone(), request).await,
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Ledger
        "get_balance" => commands::ledger::get_balance(&state, params).await,
        "credit" => commands::ledger::credit(&state, params).await,
        "debit" => commands::ledger::debit(&state, params).await,
        "get_ledger_history" => commands::ledger::get_ledger_history(&state, params).await,
        "audit_account" => commands::ledger::audit_account(&state, params).await,

        // Quiz sessions
        "start_quiz" => commands::quiz::start_quiz(&state, params).await,
        "end_quiz" => commands::quiz::end_quiz(&state, params).await,
        "get_session" => commands::quiz::get_session(&state, params).await,

        // Disclosure
        "submit_answer" => commands::disclosure::submit_answer(&state, params).await,
        "get_answers" => commands::disclosure::get_answers(&state, params).await,
        "get_affinity" => commands::disclosure::get_affinity(&state, params).await,
        "get_gallery" => commands::disclosure::get_gallery(&state, params).await,
        "get_profile" => commands::disclosure::get_profile(&state, params).await,

        // Content ingestion
        "put_preference" => commands::catalog::put_preference(&state, params).await,
        "put_photo" => commands::catalog::put_photo(&state, params).await,
        "put_profile_field" => commands::catalog::put_profile_field(&state, params).await,

        // Skill
        "get_skill" => commands::skill::get_skill(&state, params).await,
        "get_leaderboard" => commands::skill::get_leaderboard(&state, params).await,

        // Diagnostics
        "get_daemon_info" => commands::diagnostics::get_daemon_info(&state).await,
        "shutdown" => commands::diagnostics::shutdown(&state).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
