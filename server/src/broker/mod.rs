use comms::event::Event;
use tokio::sync::mpsc;

pub use self::broker::{Broker, BrokerError};
pub use self::room_registry::RoomRegistry;
pub use self::session_registry::{SessionEntry, SessionRegistry};

#[allow(clippy::module_inception)]
mod broker;
mod room_registry;
mod session_registry;

/// Identifies a single connection for its whole lifetime, usernames are not unique
pub type SessionId = String;

/// Sending half of a session's outbound queue, the session's writer task drains the other half
pub type Outbound = mpsc::UnboundedSender<Event>;

/// Rooms every broker starts with unless configured otherwise
pub const DEFAULT_ROOMS: [&str; 4] = ["General", "Gaming", "Music", "Random"];
