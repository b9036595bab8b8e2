//! HTTP surface and server bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::connection::run_session;
use crate::error::ServerError;
use crate::health::{health_check, HealthResponse};
use crate::registry::{SessionRegistry, SharedRegistry};
use crate::shutdown::ShutdownCoordinator;

/// Shared handles available to every request handler.
#[derive(Clone)]
pub struct AppState {
    registry: SharedRegistry,
    config: Arc<RelayConfig>,
    shutdown: Arc<ShutdownCoordinator>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: Arc::new(tokio::sync::RwLock::new(SessionRegistry::new())),
            config: Arc::new(config),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            started_at: Instant::now(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// The relay: one registry, one HTTP surface, one shutdown signal.
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        self.state.registry()
    }

    pub fn config(&self) -> &RelayConfig {
        self.state.config()
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        self.state.shutdown()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Binds the configured address and serves until shutdown is signalled.
    /// Returns the bound address and the serve task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
        let addr = self.state.config().bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let app = self.router();
        let token = self.state.shutdown().token();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(%err, "server stopped with error");
            }
        });

        info!(addr = %local_addr, "listening");
        Ok((local_addr, handle))
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.config().max_message_bytes)
        .on_upgrade(move |socket| run_session(socket, state))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state.registry().read().await.len();
    Json(health_check(state.started_at(), sessions))
}
