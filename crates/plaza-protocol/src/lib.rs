//! # plaza-protocol
//!
//! Wire types for the plaza relay.
//!
//! - `ClientId`: opaque server-generated session identifier
//! - `Vec3`: position/orientation vector as it appears on the wire
//! - `ClientFrame` / `ServerEvent`: inbound and outbound JSON messages,
//!   internally tagged on `"type"`

#![deny(unsafe_code)]

pub mod ids;
pub mod messages;
pub mod transform;

pub use ids::ClientId;
pub use messages::{ClientFrame, PeerState, ServerEvent};
pub use transform::Vec3;
