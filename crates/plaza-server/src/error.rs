//! Server error types.

use plaza_protocol::ClientId;
use thiserror::Error;

/// Errors from session registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A session with this id already exists.
    #[error("client {0} is already registered")]
    AlreadyRegistered(ClientId),
}

/// Errors from starting the relay server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
