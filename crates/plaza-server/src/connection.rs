//! Per-connection lifecycle: accept, join, relay, close.
//!
//! Each connection runs two halves. The reader half owns the registry
//! updates for this client; the writer half drains the session's outbound
//! queue onto the socket and paces heartbeat pings. Either half stopping
//! tears the whole session down through one close path, so a session that
//! leaves for any reason is removed exactly once and announced exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use plaza_protocol::{ClientId, ServerEvent, Vec3};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::deliver;
use crate::registry::{SendOutcome, SessionRecord};
use crate::router::dispatch;
use crate::server::AppState;

/// Pong-based liveness tracking, shared between the reader and writer
/// halves of one connection.
#[derive(Debug)]
pub struct ConnectionHealth {
    last_seen: parking_lot::Mutex<Instant>,
}

impl ConnectionHealth {
    pub fn new() -> Self {
        Self {
            last_seen: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Records inbound traffic of any kind as proof of life.
    pub fn mark_alive(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    pub fn last_seen_elapsed(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.last_seen_elapsed() > timeout
    }
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one WebSocket session from accept to close.
pub async fn run_session(socket: WebSocket, state: AppState) {
    let client_id = ClientId::new();
    let health = Arc::new(ConnectionHealth::new());
    let (outbox_tx, outbox_rx) = mpsc::channel::<Arc<String>>(state.config().send_queue);
    let (ws_tx, mut ws_rx) = socket.split();

    let mut writer = tokio::spawn(write_loop(
        ws_tx,
        outbox_rx,
        Arc::clone(&health),
        client_id.clone(),
        state.config().heartbeat_interval(),
        state.config().heartbeat_timeout(),
        state.shutdown().token(),
    ));

    // Join under one lock scope so the snapshot, the init frame, and the
    // join announcement agree on who was present. Queueing init first here
    // guarantees it is the first frame this client receives.
    {
        let mut registry = state.registry().write().await;
        if let Err(err) = registry.register(SessionRecord::new(client_id.clone(), outbox_tx)) {
            error!(client_id = %client_id, %err, "refusing connection");
            writer.abort();
            return;
        }

        let clients = registry
            .snapshot()
            .into_iter()
            .filter(|peer| peer.id != client_id)
            .collect();
        let init = ServerEvent::Init {
            clients,
            your_id: client_id.clone(),
        };
        match serde_json::to_string(&init) {
            Ok(json) => {
                if registry.send_to(&client_id, Arc::new(json)) != SendOutcome::Sent {
                    warn!(client_id = %client_id, "failed to queue init");
                }
            }
            Err(err) => error!(client_id = %client_id, %err, "failed to serialize init"),
        }

        deliver(
            &registry,
            &client_id,
            &ServerEvent::PlayerJoined {
                client_id: client_id.clone(),
                position: Vec3::ZERO,
                rotation: Vec3::ZERO,
            },
        );
    }
    info!(client_id = %client_id, "client connected");

    // Relay until the peer goes away or the writer stops.
    loop {
        tokio::select! {
            _ = &mut writer => break,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    health.mark_alive();
                    let mut registry = state.registry().write().await;
                    dispatch(&mut registry, &client_id, text.as_str());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    health.mark_alive();
                    match std::str::from_utf8(&bytes) {
                        Ok(text) => {
                            let mut registry = state.registry().write().await;
                            dispatch(&mut registry, &client_id, text);
                        }
                        Err(_) => {
                            debug!(client_id = %client_id, "ignoring non-utf8 binary frame");
                        }
                    }
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => health.mark_alive(),
                Some(Ok(Message::Close(_))) => {
                    debug!(client_id = %client_id, "client closed");
                    break;
                }
                Some(Err(err)) => {
                    debug!(client_id = %client_id, %err, "transport error");
                    break;
                }
                None => break,
            },
        }
    }

    if !writer.is_finished() {
        writer.abort();
    }

    // Leave under one lock scope: once removed, announce to everyone still
    // present. Peers that never saw this client join never hear it leave.
    {
        let mut registry = state.registry().write().await;
        if registry.remove(&client_id).is_some() {
            deliver(
                &registry,
                &client_id,
                &ServerEvent::PlayerLeft {
                    client_id: client_id.clone(),
                },
            );
        }
    }
    info!(client_id = %client_id, "client disconnected");
}

/// Drains the outbound queue onto the socket and paces heartbeat pings.
/// Stops on the first failed send; the reader notices and runs the close
/// path.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<Arc<String>>,
    health: Arc<ConnectionHealth>,
    client_id: ClientId,
    ping_interval: Duration,
    pong_timeout: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(ping_interval);
    // The first tick resolves immediately; skip it so pings start one full
    // interval after connect.
    ticker.tick().await;

    loop {
        tokio::select! {
            payload = outbox.recv() => match payload {
                Some(payload) => {
                    if let Err(err) = ws_tx.send(Message::Text(payload.as_str().into())).await {
                        debug!(client_id = %client_id, %err, "send failed, stopping writer");
                        break;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if health.is_stale(pong_timeout) {
                    info!(client_id = %client_id, "no traffic within timeout, closing");
                    break;
                }
                if let Err(err) = ws_tx.send(Message::Ping(Bytes::new())).await {
                    debug!(client_id = %client_id, %err, "ping failed, stopping writer");
                    break;
                }
            }
            _ = shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }
}
