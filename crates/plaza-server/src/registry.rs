//! Session registry: the shared map of connected clients.
//!
//! The registry itself is a plain map with `&mut self` mutators. It does not
//! lock anything internally; callers serialize access through one
//! [`SharedRegistry`] and hold the write guard across every mutate-and-notify
//! pair so joins, leaves, and transform updates stay atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use plaza_protocol::{ClientId, PeerState, Vec3};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::RegistryError;

/// Registry shared across connection tasks.
pub type SharedRegistry = Arc<tokio::sync::RwLock<SessionRegistry>>;

/// Result of enqueueing a payload onto a session's outbound queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The payload was queued for the writer task.
    Sent,
    /// The queue was full; the payload was dropped.
    Full,
    /// The writer task is gone; the payload was dropped.
    Closed,
}

/// One connected client: its id, last known transform, and outbound queue.
#[derive(Debug)]
pub struct SessionRecord {
    id: ClientId,
    position: Vec3,
    orientation: Vec3,
    outbox: mpsc::Sender<Arc<String>>,
    dropped: AtomicU64,
}

impl SessionRecord {
    /// Creates a record at the origin with no rotation.
    pub fn new(id: ClientId, outbox: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            outbox,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    /// Payloads dropped on this session because its queue was full or closed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queues a payload without waiting. Never blocks the caller: a slow
    /// client loses messages instead of stalling the sender.
    pub fn enqueue(&self, payload: Arc<String>) -> SendOutcome {
        match self.outbox.try_send(payload) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                SendOutcome::Full
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                SendOutcome::Closed
            }
        }
    }

    fn state(&self) -> PeerState {
        PeerState {
            id: self.id.clone(),
            position: self.position,
            rotation: self.orientation,
        }
    }
}

/// Map of session id to record. No interior locking.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ClientId, SessionRecord>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session. Fails if the id is already present, leaving the
    /// existing session untouched.
    pub fn register(&mut self, record: SessionRecord) -> Result<(), RegistryError> {
        if self.sessions.contains_key(&record.id) {
            return Err(RegistryError::AlreadyRegistered(record.id.clone()));
        }
        self.sessions.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, id: &ClientId) -> Option<&SessionRecord> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Updates a session's position. Returns `false` for unknown ids.
    pub fn set_position(&mut self, id: &ClientId, position: Vec3) -> bool {
        match self.sessions.get_mut(id) {
            Some(record) => {
                record.position = position;
                true
            }
            None => false,
        }
    }

    /// Updates a session's orientation. Returns `false` for unknown ids.
    pub fn set_orientation(&mut self, id: &ClientId, orientation: Vec3) -> bool {
        match self.sessions.get_mut(id) {
            Some(record) => {
                record.orientation = orientation;
                true
            }
            None => false,
        }
    }

    /// Removes a session, returning its record if it was present.
    pub fn remove(&mut self, id: &ClientId) -> Option<SessionRecord> {
        self.sessions.remove(id)
    }

    /// Point-in-time view of every session's id and transform.
    pub fn snapshot(&self) -> Vec<PeerState> {
        self.sessions.values().map(SessionRecord::state).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Queues a payload for one session. Unknown ids count as closed.
    pub fn send_to(&self, id: &ClientId, payload: Arc<String>) -> SendOutcome {
        match self.sessions.get(id) {
            Some(record) => record.enqueue(payload),
            None => SendOutcome::Closed,
        }
    }
}
