//! WebSocket support for real-time engine events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use vigil_core::EngineLogger;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients for each engine event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// An engine run began.
    Started { run_id: String },
    /// An engine run completed.
    Finished {
        run_id: String,
        finish_time: String,
        error: Option<String>,
    },
    /// A topic was checked, nothing new.
    Info { run_id: String, message: String },
    /// A topic check failed.
    Failed { run_id: String, message: String },
    /// A new torrent was found and sent to a client.
    Downloaded {
        run_id: String,
        message: String,
        size: usize,
    },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Started { .. } => "started",
            WsMessage::Finished { .. } => "finished",
            WsMessage::Info { .. } => "info",
            WsMessage::Failed { .. } => "failed",
            WsMessage::Downloaded { .. } => "downloaded",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// `EngineLogger` that fans engine events out to WebSocket clients.
///
/// Delivery never blocks the engine: the broadcast channel drops the
/// oldest messages when a subscriber lags.
pub struct WsLogger {
    broadcaster: WsBroadcaster,
}

impl WsLogger {
    pub fn new(broadcaster: WsBroadcaster) -> Self {
        Self { broadcaster }
    }
}

#[async_trait::async_trait]
impl EngineLogger for WsLogger {
    async fn started(&self, run_id: &str) {
        info!(run_id, "Engine run started");
        self.broadcaster.broadcast(WsMessage::Started {
            run_id: run_id.to_string(),
        });
    }

    async fn finished(&self, run_id: &str, finish_time: DateTime<Utc>, error: Option<&str>) {
        match error {
            Some(reason) => error!(run_id, reason, "Engine run aborted"),
            None => info!(run_id, "Engine run finished"),
        }
        self.broadcaster.broadcast(WsMessage::Finished {
            run_id: run_id.to_string(),
            finish_time: finish_time.to_rfc3339(),
            error: error.map(|e| e.to_string()),
        });
    }

    async fn info(&self, run_id: &str, message: &str) {
        debug!(run_id, "{}", message);
        self.broadcaster.broadcast(WsMessage::Info {
            run_id: run_id.to_string(),
            message: message.to_string(),
        });
    }

    async fn failed(&self, run_id: &str, message: &str) {
        warn!(run_id, "{}", message);
        self.broadcaster.broadcast(WsMessage::Failed {
            run_id: run_id.to_string(),
            message: message.to_string(),
        });
    }

    async fn downloaded(&self, run_id: &str, message: &str, size: usize) {
        info!(run_id, size, "{}", message);
        self.broadcaster.broadcast(WsMessage::Downloaded {
            run_id: run_id.to_string(),
            message: message.to_string(),
            size,
        });
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Handle incoming messages from the client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
