use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::file::{FileParseError, FilePayload};

/// Placeholder shown in the online list for users which are not in any room
pub const LOBBY: &str = "Lobby";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("unknown event tag in line '{0}'")]
    UnknownTag(String),
    #[error("event '{tag}' is missing the {field} field")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },
    #[error("invalid file in event: {0}")]
    InvalidFile(#[from] FileParseError),
}

/// An entry of the online users list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub username: String,
    /// The room the user is currently in, [None] while they are in the lobby
    pub room: Option<String>,
}

impl fmt::Display for OnlineUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.username,
            self.room.as_deref().unwrap_or(LOBBY)
        )
    }
}

/// Events that can be sent to the client
/// Events maybe related to different users and rooms, the receipient is a single chat session
///
/// Every event is a single line in the form of `TAG:payload`, only the documented
/// delimiter colons are significant, the trailing field may contain colons itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `ROOMS:<room1,room2,...>`
    Rooms(Vec<String>),
    /// `ONLINE:<user:room_or_Lobby,...>`
    Online(Vec<OnlineUser>),
    /// `MSG:<room>:<sender>:<text>`
    Message {
        room: String,
        sender: String,
        content: String,
    },
    /// `SYSTEM:<text>`
    System(String),
    /// `JOINED:<room>`
    Joined(String),
    /// `LEFT:<room>`
    Left(String),
    /// `PM:<from>:<text>`
    PrivateMessage { from: String, content: String },
    /// `PM_SENT:<to>:<text>`
    PrivateMessageSent { to: String, content: String },
    /// `ROOM_CREATED:<room>`
    RoomCreated(String),
    /// `FILE:<room>:<sender>:<filename>:<size>:<base64>`
    File {
        room: String,
        sender: String,
        file: FilePayload,
    },
    /// `USER_JOINED:<name>`
    UserJoined(String),
    /// `USER_LEFT:<name>`
    UserLeft(String),
}

impl Event {
    pub fn system(text: impl Into<String>) -> Self {
        Event::System(text.into())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Rooms(rooms) => write!(f, "ROOMS:{}", rooms.join(",")),
            Event::Online(users) => {
                write!(f, "ONLINE:")?;
                for (i, user) in users.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", user)?;
                }
                Ok(())
            }
            Event::Message {
                room,
                sender,
                content,
            } => write!(f, "MSG:{}:{}:{}", room, sender, content),
            Event::System(text) => write!(f, "SYSTEM:{}", text),
            Event::Joined(room) => write!(f, "JOINED:{}", room),
            Event::Left(room) => write!(f, "LEFT:{}", room),
            Event::PrivateMessage { from, content } => write!(f, "PM:{}:{}", from, content),
            Event::PrivateMessageSent { to, content } => write!(f, "PM_SENT:{}:{}", to, content),
            Event::RoomCreated(room) => write!(f, "ROOM_CREATED:{}", room),
            Event::File { room, sender, file } => write!(f, "FILE:{}:{}:{}", room, sender, file),
            Event::UserJoined(name) => write!(f, "USER_JOINED:{}", name),
            Event::UserLeft(name) => write!(f, "USER_LEFT:{}", name),
        }
    }
}

/// Split the payload into exactly `N` fields, the last one keeps any remaining colons
fn split_fields<const N: usize>(
    tag: &'static str,
    payload: &str,
    names: [&'static str; N],
) -> Result<[String; N], EventParseError> {
    let mut parts = payload.splitn(N, ':');
    let mut fields: [String; N] = std::array::from_fn(|_| String::new());

    for (field, name) in fields.iter_mut().zip(names) {
        *field = String::from(
            parts
                .next()
                .ok_or(EventParseError::MissingField { tag, field: name })?,
        );
    }

    Ok(fields)
}

fn parse_online_users(payload: &str) -> Result<Vec<OnlineUser>, EventParseError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    payload
        .split(',')
        .map(|entry| {
            let (username, room) = entry.rsplit_once(':').ok_or(EventParseError::MissingField {
                tag: "ONLINE",
                field: "room",
            })?;

            Ok(OnlineUser {
                username: String::from(username),
                room: (room != LOBBY).then(|| String::from(room)),
            })
        })
        .collect()
}

impl FromStr for Event {
    type Err = EventParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (tag, payload) = line
            .split_once(':')
            .ok_or_else(|| EventParseError::UnknownTag(String::from(line)))?;

        let event = match tag {
            "ROOMS" => Event::Rooms(if payload.is_empty() {
                Vec::new()
            } else {
                payload.split(',').map(String::from).collect()
            }),
            "ONLINE" => Event::Online(parse_online_users(payload)?),
            "MSG" => {
                let [room, sender, content] =
                    split_fields("MSG", payload, ["room", "sender", "text"])?;
                Event::Message {
                    room,
                    sender,
                    content,
                }
            }
            "SYSTEM" => Event::System(String::from(payload)),
            "JOINED" => Event::Joined(String::from(payload)),
            "LEFT" => Event::Left(String::from(payload)),
            "PM" => {
                let [from, content] = split_fields("PM", payload, ["from", "text"])?;
                Event::PrivateMessage { from, content }
            }
            "PM_SENT" => {
                let [to, content] = split_fields("PM_SENT", payload, ["to", "text"])?;
                Event::PrivateMessageSent { to, content }
            }
            "ROOM_CREATED" => Event::RoomCreated(String::from(payload)),
            "FILE" => {
                let [room, sender, file] =
                    split_fields("FILE", payload, ["room", "sender", "file"])?;
                Event::File {
                    room,
                    sender,
                    file: file.parse()?,
                }
            }
            "USER_JOINED" => Event::UserJoined(String::from(payload)),
            "USER_LEFT" => Event::UserLeft(String::from(payload)),
            _ => return Err(EventParseError::UnknownTag(String::from(line))),
        };

        Ok(event)
    }
}
