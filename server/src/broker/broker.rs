use comms::event::Event;
use thiserror::Error;
use tokio::sync::Mutex;

use super::{
    room_registry::RoomRegistry,
    session_registry::{SessionEntry, SessionRegistry},
    Outbound, SessionId,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),
    #[error("session '{0}' is not registered")]
    SessionNotFound(String),
}

/// [Broker] is the process wide registry of rooms and connected sessions.
///
/// Every mutation goes through one of two guards, one for the room membership and one for
/// the set of sessions. When both are needed the room guard is always taken first.
/// Events are pushed into each recipient's unbounded outbound queue while the guards are held,
/// so a broadcast has reached every recipient's queue by the time the call returns.
#[derive(Debug)]
pub struct Broker {
    rooms: Mutex<RoomRegistry>,
    sessions: Mutex<SessionRegistry>,
}

impl Broker {
    pub fn new<S: AsRef<str>>(default_rooms: &[S]) -> Self {
        Broker {
            rooms: Mutex::new(RoomRegistry::new(default_rooms)),
            sessions: Mutex::new(SessionRegistry::new()),
        }
    }

    /// Add a freshly accepted connection to the set of sessions
    ///
    /// Returns false if the id is already taken, the existing session is left untouched.
    pub async fn register(&self, session_id: &str, outbound: Outbound) -> bool {
        self.sessions
            .lock()
            .await
            .insert(SessionEntry::new(session_id, outbound))
    }

    /// Set the username of a session, returns the previous name if there was one
    pub async fn set_username(
        &self,
        session_id: &str,
        username: &str,
    ) -> Result<Option<String>, BrokerError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| BrokerError::SessionNotFound(String::from(session_id)))?;

        Ok(entry.username.replace(String::from(username)))
    }

    /// Remove a session from the set of sessions and from any room it is still in
    ///
    /// No notices are sent, see [Broker::leave_room] for announcing a departure.
    pub async fn unregister(&self, session_id: &str) -> Option<SessionEntry> {
        let mut rooms = self.rooms.lock().await;
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.remove(session_id)?;

        if let Some(room) = &entry.current_room {
            rooms.remove_member(room, session_id);
        }

        tracing::debug!(session_id, username = ?entry.username, "session unregistered");

        Some(entry)
    }

    /// Create an empty room, returns false if the name is already taken
    pub async fn create_room(&self, name: &str) -> bool {
        let created = self.rooms.lock().await.create(name);

        if created {
            tracing::info!(room = name, "room created");
        }

        created
    }

    /// Move a session into the given room, leaving the room it is currently in
    ///
    /// The membership change happens in a single critical section, a session is never
    /// a member of two rooms. The room which was left, if any, is returned.
    /// Joining a room which does not exist fails and keeps the session where it was.
    pub async fn join_room(
        &self,
        session_id: &str,
        room: &str,
    ) -> Result<Option<String>, BrokerError> {
        let (previous, username) = {
            let mut rooms = self.rooms.lock().await;
            if !rooms.contains(room) {
                return Err(BrokerError::RoomNotFound(String::from(room)));
            }

            let mut sessions = self.sessions.lock().await;
            let entry = sessions
                .get_mut(session_id)
                .ok_or_else(|| BrokerError::SessionNotFound(String::from(session_id)))?;

            let previous = entry.current_room.replace(String::from(room));
            if let Some(previous) = &previous {
                rooms.remove_member(previous, session_id);
            }
            rooms.insert_member(room, session_id);

            (previous, String::from(entry.display_name()))
        };

        // rejoining the current room only announces the join
        if let Some(previous) = previous.as_deref().filter(|previous| *previous != room) {
            self.broadcast_to_room(previous, Event::system(format!("{} left {}", username, previous)))
                .await;
        }
        self.broadcast_to_room(room, Event::system(format!("{} joined {}", username, room)))
            .await;

        tracing::info!(session_id, %username, room, "joined room");

        Ok(previous)
    }

    /// Take a session out of its current room and tell the remaining members
    ///
    /// Returns the room which was left, or [None] if the session was not in a room.
    pub async fn leave_room(&self, session_id: &str) -> Option<String> {
        let (room, username) = {
            let mut rooms = self.rooms.lock().await;
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(session_id)?;
            let room = entry.current_room.take()?;

            rooms.remove_member(&room, session_id);

            (room, String::from(entry.display_name()))
        };

        self.broadcast_to_room(&room, Event::system(format!("{} left {}", username, room)))
            .await;

        tracing::info!(session_id, %username, %room, "left room");

        Some(room)
    }

    /// Deliver an event to the current members of a room
    ///
    /// Members which disconnected in the meantime are skipped.
    /// Returns the number of sessions the event was queued for.
    pub async fn broadcast_to_room(&self, room: &str, event: Event) -> usize {
        let rooms = self.rooms.lock().await;
        let Some(members) = rooms.members(room) else {
            return 0;
        };
        let sessions = self.sessions.lock().await;

        deliver(
            members.iter().filter_map(|session_id| sessions.get(session_id)),
            &event,
        )
    }

    /// Deliver an event to every connected session
    pub async fn broadcast_to_all(&self, event: Event) -> usize {
        let sessions = self.sessions.lock().await;

        deliver(sessions.iter(), &event)
    }

    /// Deliver an event to a single session, returns false if the session is gone
    pub async fn send_to(&self, session_id: &str, event: Event) -> bool {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|entry| entry.send(event))
            .unwrap_or(false)
    }

    /// First session registered under the given username
    pub async fn find_by_username(&self, username: &str) -> Option<SessionId> {
        self.sessions
            .lock()
            .await
            .find_by_username(username)
            .map(|entry| entry.id.clone())
    }

    /// `ROOMS:` event describing every room
    pub async fn room_list(&self) -> Event {
        Event::Rooms(self.rooms.lock().await.names().to_vec())
    }

    /// `ONLINE:` event describing every named session and where it is
    pub async fn online_list(&self) -> Event {
        Event::Online(self.sessions.lock().await.online_users())
    }

    /// Sorted snapshot of the sessions in a room, [None] if the room does not exist
    pub async fn room_members(&self, room: &str) -> Option<Vec<SessionId>> {
        let rooms = self.rooms.lock().await;
        let mut members: Vec<SessionId> = rooms.members(room)?.iter().cloned().collect();
        members.sort();

        Some(members)
    }

    pub async fn current_room(&self, session_id: &str) -> Option<String> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .and_then(|entry| entry.current_room.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn deliver<'a>(recipients: impl Iterator<Item = &'a SessionEntry>, event: &Event) -> usize {
    let mut delivered = 0;

    for recipient in recipients {
        if recipient.send(event.clone()) {
            delivered += 1;
        } else {
            tracing::debug!(session_id = %recipient.id, "skipping closed session");
        }
    }

    delivered
}
