//! In-memory session registry.

use crate::Session;
use uuid::Uuid;
use std::collections::HashMap;

/// Owns every live [`Session`] record, keyed by id.
///
/// The registry itself is plain data; the [`Hub`](crate::Hub) serializes all
/// access behind its lock. Sessions are reclaimed only by explicit removal
/// (grace-period expiry) — a session whose admin never cleanly disconnects
/// is never deleted. That leak is a known limitation of the design.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and insert an empty session. Uniqueness rests on
    /// the v4 id space; a collision with a live session is treated as
    /// impossible rather than checked for.
    pub fn create(&mut self, admin_username: Option<String>) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions.insert(session_id, Session::new(admin_username));
        session_id
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Lookup. Absence is an expected outcome, not an error.
    pub fn get(&self, session_id: Uuid) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    pub fn get_mut(&mut self, session_id: Uuid) -> Option<&mut Session> {
        self.sessions.get_mut(&session_id)
    }

    /// Remove a session. Idempotent; removing an absent id is a no-op.
    pub fn remove(&mut self, session_id: Uuid) -> Option<Session> {
        self.sessions.remove(&session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
