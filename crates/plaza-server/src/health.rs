//! Liveness endpoint payload.

use std::time::Instant;

use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub sessions: usize,
}

pub fn health_check(started_at: Instant, sessions: usize) -> HealthResponse {
    HealthResponse {
        status: "ok",
        uptime_secs: started_at.elapsed().as_secs(),
        sessions,
    }
}
