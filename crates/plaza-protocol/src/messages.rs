use serde::{Deserialize, Serialize};

use crate::ids::ClientId;
use crate::transform::Vec3;

/// Inbound frame from a participant.
///
/// The wire carries a `clientId` field, but the relay identifies senders by
/// the connection the frame arrived on; the field is deserialized only so a
/// mismatch can be observed, never used for lookup. Frames with a kind the
/// relay does not know fold into `Unknown` and are dropped without comment.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "position", rename_all = "camelCase")]
    Position {
        #[serde(default)]
        client_id: Option<String>,
        data: Vec3,
    },

    #[serde(rename = "rotation", rename_all = "camelCase")]
    Rotation {
        #[serde(default)]
        client_id: Option<String>,
        data: Vec3,
    },

    #[serde(rename = "interaction", rename_all = "camelCase")]
    Interaction {
        #[serde(default)]
        client_id: Option<String>,
        data: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}

/// One entry in the `init` roster: another live session and its latest
/// transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerState {
    pub id: ClientId,
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Outbound event from the relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// First frame on every connection: the current roster (excluding the
    /// recipient) and the recipient's own assigned id.
    #[serde(rename = "init", rename_all = "camelCase")]
    Init {
        clients: Vec<PeerState>,
        your_id: ClientId,
    },

    #[serde(rename = "playerJoined", rename_all = "camelCase")]
    PlayerJoined {
        client_id: ClientId,
        position: Vec3,
        rotation: Vec3,
    },

    #[serde(rename = "playerLeft", rename_all = "camelCase")]
    PlayerLeft { client_id: ClientId },

    #[serde(rename = "playerMoved", rename_all = "camelCase")]
    PlayerMoved { client_id: ClientId, position: Vec3 },

    #[serde(rename = "playerRotated", rename_all = "camelCase")]
    PlayerRotated { client_id: ClientId, rotation: Vec3 },

    /// Opaque interaction payload relayed as-is.
    #[serde(rename = "playerInteraction", rename_all = "camelCase")]
    PlayerInteraction {
        client_id: ClientId,
        data: serde_json::Value,
    },
}

impl ServerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::PlayerMoved { .. } => "playerMoved",
            Self::PlayerRotated { .. } => "playerRotated",
            Self::PlayerInteraction { .. } => "playerInteraction",
        }
    }
}
