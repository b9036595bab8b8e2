//! Coordinated shutdown across server tasks.

use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans a single shutdown signal out to every task holding a token.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for a task that should observe shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signals shutdown. Safe to call more than once.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signals shutdown, then waits up to `timeout` for `handles` to finish.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        self.shutdown();
        if handles.is_empty() {
            return;
        }

        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        let count = handles.len();
        match tokio::time::timeout(timeout, join_all(handles)).await {
            Ok(results) => {
                let panicked = results.iter().filter(|r| r.is_err()).count();
                if panicked > 0 {
                    warn!(panicked, "tasks did not shut down cleanly");
                } else {
                    info!(count, "all tasks shut down");
                }
            }
            Err(_) => {
                warn!(count, ?timeout, "shutdown timed out before tasks finished");
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
