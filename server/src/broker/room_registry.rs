use std::collections::{HashMap, HashSet};

use super::SessionId;

/// [RoomRegistry] keeps the members of every room, keyed by the case-sensitive room name
///
/// Rooms are never deleted, an empty room stays listed. Names are kept in creation order
/// so that the room list is stable for the clients.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    members: HashMap<String, HashSet<SessionId>>,
    names: Vec<String>,
}

impl RoomRegistry {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut registry = RoomRegistry::default();

        for name in names {
            registry.create(name.as_ref());
        }

        registry
    }

    /// Create an empty room, returns false if a room with the same name already exists
    pub fn create(&mut self, name: &str) -> bool {
        if self.members.contains_key(name) {
            return false;
        }

        self.members.insert(String::from(name), HashSet::new());
        self.names.push(String::from(name));

        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn members(&self, name: &str) -> Option<&HashSet<SessionId>> {
        self.members.get(name)
    }

    /// Add a session to a room, returns false if the room does not exist
    pub fn insert_member(&mut self, name: &str, session_id: &str) -> bool {
        match self.members.get_mut(name) {
            Some(members) => {
                members.insert(String::from(session_id));
                true
            }
            None => false,
        }
    }

    /// Remove a session from a room, returns true if it was a member
    pub fn remove_member(&mut self, name: &str, session_id: &str) -> bool {
        self.members
            .get_mut(name)
            .map(|members| members.remove(session_id))
            .unwrap_or(false)
    }
}
