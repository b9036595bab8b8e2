//! Fan-out of server events to every session except the sender.

use std::sync::Arc;

use plaza_protocol::{ClientId, ServerEvent};
use tracing::{debug, error, warn};

use crate::registry::{SendOutcome, SessionRegistry};

/// Serializes `event` once and queues it for every session other than
/// `sender`. Returns how many queues accepted it.
///
/// A full or closed queue is logged and skipped; it never unwinds the
/// fan-out and never removes the recipient. A session whose writer has
/// already gone away stays in the registry until its own close path runs.
pub fn deliver(registry: &SessionRegistry, sender: &ClientId, event: &ServerEvent) -> usize {
    let payload = match serde_json::to_string(event) {
        Ok(json) => Arc::new(json),
        Err(err) => {
            error!(event = event.event_type(), %err, "failed to serialize event");
            return 0;
        }
    };

    let mut sent = 0;
    for record in registry.iter() {
        if record.id() == sender {
            continue;
        }
        match record.enqueue(Arc::clone(&payload)) {
            SendOutcome::Sent => sent += 1,
            SendOutcome::Full => {
                warn!(
                    client_id = %record.id(),
                    event = event.event_type(),
                    dropped = record.dropped_count(),
                    "outbound queue full, dropping event"
                );
            }
            SendOutcome::Closed => {
                debug!(
                    client_id = %record.id(),
                    event = event.event_type(),
                    "outbound queue closed, dropping event"
                );
            }
        }
    }
    sent
}
