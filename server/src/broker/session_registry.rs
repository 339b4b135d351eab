use comms::event::{Event, OnlineUser};

use super::{Outbound, SessionId};

/// A connected session as seen by the broker
#[derive(Debug)]
pub struct SessionEntry {
    pub id: SessionId,
    /// Unset until the client sends `USERNAME:`
    pub username: Option<String>,
    pub current_room: Option<String>,
    outbound: Outbound,
}

impl SessionEntry {
    pub fn new(id: &str, outbound: Outbound) -> Self {
        SessionEntry {
            id: String::from(id),
            username: None,
            current_room: None,
            outbound,
        }
    }

    /// Queue an event for the session's writer, returns false if the session is already gone
    pub fn send(&self, event: Event) -> bool {
        self.outbound.send(event).is_ok()
    }

    /// Name used in notices about this session
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Anonymous")
    }
}

/// [SessionRegistry] is the set of all connected sessions, kept in registration order
///
/// Lookups are linear, which is fine for the handful of users a relay like this serves.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: Vec<SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Add a session, returns false if a session with the same id is already registered
    pub fn insert(&mut self, entry: SessionEntry) -> bool {
        if self.get(&entry.id).is_some() {
            return false;
        }

        self.entries.push(entry);

        true
    }

    pub fn remove(&mut self, session_id: &str) -> Option<SessionEntry> {
        let index = self.entries.iter().position(|entry| entry.id == session_id)?;

        Some(self.entries.remove(index))
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionEntry> {
        self.entries.iter().find(|entry| entry.id == session_id)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut SessionEntry> {
        self.entries.iter_mut().find(|entry| entry.id == session_id)
    }

    /// First session registered under the given username
    pub fn find_by_username(&self, username: &str) -> Option<&SessionEntry> {
        self.entries
            .iter()
            .find(|entry| entry.username.as_deref() == Some(username))
    }

    /// Sessions which picked a username, paired with the room they are in
    pub fn online_users(&self) -> Vec<OnlineUser> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry.username.as_ref().map(|username| OnlineUser {
                    username: username.clone(),
                    room: entry.current_room.clone(),
                })
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
