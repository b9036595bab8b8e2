//! Routing of inbound client frames to registry updates and fan-out.

use plaza_protocol::{ClientFrame, ClientId, ServerEvent};
use tracing::{debug, warn};

use crate::broadcast::deliver;
use crate::registry::SessionRegistry;

/// Parses one raw text frame from `sender` and applies it.
///
/// The sender's identity is the connection's registered id. A `clientId`
/// inside the payload is never trusted; a mismatching one is noted and
/// ignored. Malformed frames and unrecognized kinds are dropped without
/// touching the connection.
pub fn dispatch(registry: &mut SessionRegistry, sender: &ClientId, raw: &str) {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(client_id = %sender, %err, "discarding malformed frame");
            return;
        }
    };

    match frame {
        ClientFrame::Position { client_id, data } => {
            note_claimed_id(sender, client_id.as_deref());
            if !registry.set_position(sender, data) {
                debug!(client_id = %sender, "position frame from unregistered sender");
                return;
            }
            deliver(
                registry,
                sender,
                &ServerEvent::PlayerMoved {
                    client_id: sender.clone(),
                    position: data,
                },
            );
        }
        ClientFrame::Rotation { client_id, data } => {
            note_claimed_id(sender, client_id.as_deref());
            if !registry.set_orientation(sender, data) {
                debug!(client_id = %sender, "rotation frame from unregistered sender");
                return;
            }
            deliver(
                registry,
                sender,
                &ServerEvent::PlayerRotated {
                    client_id: sender.clone(),
                    rotation: data,
                },
            );
        }
        ClientFrame::Interaction { client_id, data } => {
            note_claimed_id(sender, client_id.as_deref());
            if !registry.contains(sender) {
                debug!(client_id = %sender, "interaction frame from unregistered sender");
                return;
            }
            deliver(
                registry,
                sender,
                &ServerEvent::PlayerInteraction {
                    client_id: sender.clone(),
                    data,
                },
            );
        }
        ClientFrame::Unknown => {}
    }
}

fn note_claimed_id(sender: &ClientId, claimed: Option<&str>) {
    if let Some(claimed) = claimed {
        if claimed != sender.as_str() {
            debug!(client_id = %sender, claimed, "ignoring client-supplied id");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SessionRecord;
    use plaza_protocol::Vec3;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn join(registry: &mut SessionRegistry, id: &str) -> mpsc::Receiver<Arc<String>> {
        let (tx, rx) = mpsc::channel(8);
        registry
            .register(SessionRecord::new(ClientId::from_raw(id), tx))
            .unwrap();
        rx
    }

    fn id(raw: &str) -> ClientId {
        ClientId::from_raw(raw)
    }

    fn recv_json(rx: &mut mpsc::Receiver<Arc<String>>) -> serde_json::Value {
        serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn position_frame_updates_and_fans_out() {
        let mut registry = SessionRegistry::new();
        let mut rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"position","data":{"x":1.0,"y":2.0,"z":3.0}}"#,
        );

        assert_eq!(
            registry.get(&id("player_a")).unwrap().position(),
            Vec3::new(1.0, 2.0, 3.0)
        );
        let event = recv_json(&mut rx_b);
        assert_eq!(event["type"], "playerMoved");
        assert_eq!(event["clientId"], "player_a");
        assert_eq!(event["position"]["z"], 3.0);
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn rotation_frame_updates_and_fans_out() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"rotation","data":{"x":0.0,"y":90.0,"z":0.0}}"#,
        );

        assert_eq!(
            registry.get(&id("player_a")).unwrap().orientation(),
            Vec3::new(0.0, 90.0, 0.0)
        );
        let event = recv_json(&mut rx_b);
        assert_eq!(event["type"], "playerRotated");
        assert_eq!(event["rotation"]["y"], 90.0);
    }

    #[test]
    fn interaction_data_passes_through_unchanged() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"interaction","data":{"kind":"grab","target":"cube-7","strength":0.5}}"#,
        );

        let event = recv_json(&mut rx_b);
        assert_eq!(event["type"], "playerInteraction");
        assert_eq!(event["clientId"], "player_a");
        assert_eq!(event["data"]["kind"], "grab");
        assert_eq!(event["data"]["target"], "cube-7");
        assert_eq!(event["data"]["strength"], 0.5);
    }

    #[test]
    fn spoofed_client_id_is_ignored() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        // a claims to be b; the update and the broadcast both use a.
        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"position","clientId":"player_b","data":{"x":5.0,"y":5.0,"z":5.0}}"#,
        );

        assert_eq!(
            registry.get(&id("player_a")).unwrap().position(),
            Vec3::new(5.0, 5.0, 5.0)
        );
        assert_eq!(registry.get(&id("player_b")).unwrap().position(), Vec3::ZERO);
        let event = recv_json(&mut rx_b);
        assert_eq!(event["clientId"], "player_a");
    }

    #[test]
    fn matching_client_id_is_fine() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"position","clientId":"player_a","data":{"x":1.0,"y":0.0,"z":0.0}}"#,
        );

        assert_eq!(recv_json(&mut rx_b)["clientId"], "player_a");
    }

    #[test]
    fn malformed_json_is_dropped() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(&mut registry, &id("player_a"), "{not json");

        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.get(&id("player_a")).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn frame_with_bad_data_shape_is_dropped() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"position","data":"not a vector"}"#,
        );

        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.get(&id("player_a")).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn unknown_kind_is_silently_dropped() {
        let mut registry = SessionRegistry::new();
        let _rx_a = join(&mut registry, "player_a");
        let mut rx_b = join(&mut registry, "player_b");

        dispatch(
            &mut registry,
            &id("player_a"),
            r#"{"type":"teleport","data":{"x":1.0,"y":1.0,"z":1.0}}"#,
        );

        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.get(&id("player_a")).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn position_from_unregistered_sender_is_dropped() {
        let mut registry = SessionRegistry::new();
        let mut rx_a = join(&mut registry, "player_a");

        dispatch(
            &mut registry,
            &id("player_ghost"),
            r#"{"type":"position","data":{"x":1.0,"y":1.0,"z":1.0}}"#,
        );

        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn interaction_from_unregistered_sender_is_dropped() {
        let mut registry = SessionRegistry::new();
        let mut rx_a = join(&mut registry, "player_a");

        dispatch(
            &mut registry,
            &id("player_ghost"),
            r#"{"type":"interaction","data":{"kind":"wave"}}"#,
        );

        assert!(rx_a.try_recv().is_err());
    }
}
