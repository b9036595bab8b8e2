//! Real-time presence relay.
//!
//! Clients connect over a WebSocket, get an id and a snapshot of everyone
//! already present, and from then on every transform or interaction they
//! send is fanned out to every other client:
//!
//! - [`registry`]: the shared map of connected sessions and their transforms
//! - [`connection`]: per-connection accept, join, relay, and close lifecycle
//! - [`router`]: parses inbound frames and applies them with the
//!   connection's own identity
//! - [`broadcast`]: serialize-once fan-out that never blocks on a slow peer
//! - [`server`]: the axum surface binding `/ws` and `/health`

#![deny(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod registry;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::RelayConfig;
pub use server::{AppState, RelayServer};
pub use shutdown::ShutdownCoordinator;
