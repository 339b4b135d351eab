use std::fmt;

use thiserror::Error;

use crate::file::{FileParseError, FilePayload};

const USERNAME_PREFIX: &str = "USERNAME:";

/// Errors produced while turning a client line into a [UserCommand]
///
/// None of these are fatal for a session, the server replies with the error text and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Username cannot be empty")]
    EmptyUsername,
    #[error("Missing argument for {command}, usage: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },
    #[error("Invalid file: {0}")]
    InvalidFile(#[from] FileParseError),
}

/// A single line sent by a client, interpreted as a command.
/// All commands are processed in the context of the chat server paired with an individual user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `USERNAME:<name>`, registers the session under a name
    Username(String),
    /// `/join <room>`
    JoinRoom(String),
    /// `/leave`
    LeaveRoom,
    /// `/create <room>`
    CreateRoom(String),
    /// `/pm <user> <message>`
    PrivateMessage { to: String, content: String },
    /// `/rooms`
    ListRooms,
    /// `/online`
    ListOnline,
    /// `/file <filename>:<size>:<base64data>`
    SendFile(FilePayload),
    /// Any other line starting with `/`, holds the lower-cased command name
    Unknown(String),
    /// Free text, sent to the current room
    Chat(String),
}

impl UserCommand {
    /// Parse a single line, without its line terminator
    pub fn parse(line: &str) -> Result<UserCommand, CommandParseError> {
        if line.starts_with('/') {
            return Self::parse_slash_command(line);
        }

        if let Some(username) = line.strip_prefix(USERNAME_PREFIX) {
            if username.is_empty() {
                return Err(CommandParseError::EmptyUsername);
            }

            return Ok(UserCommand::Username(String::from(username)));
        }

        Ok(UserCommand::Chat(String::from(line)))
    }

    fn parse_slash_command(line: &str) -> Result<UserCommand, CommandParseError> {
        let mut parts = line.splitn(3, ' ');
        // splitn always yields at least one item
        let name = parts.next().unwrap_or_default().to_lowercase();
        let first = parts.next().filter(|arg| !arg.is_empty());
        let rest = parts.next();

        let command = match name.as_str() {
            "/join" => UserCommand::JoinRoom(String::from(first.ok_or(
                CommandParseError::MissingArgument {
                    command: "/join",
                    usage: "/join <room>",
                },
            )?)),
            "/leave" => UserCommand::LeaveRoom,
            "/create" => UserCommand::CreateRoom(String::from(first.ok_or(
                CommandParseError::MissingArgument {
                    command: "/create",
                    usage: "/create <room>",
                },
            )?)),
            "/pm" => match (first, rest) {
                (Some(to), Some(content)) => UserCommand::PrivateMessage {
                    to: String::from(to),
                    content: String::from(content),
                },
                _ => {
                    return Err(CommandParseError::MissingArgument {
                        command: "/pm",
                        usage: "/pm <user> <message>",
                    })
                }
            },
            "/rooms" => UserCommand::ListRooms,
            "/online" => UserCommand::ListOnline,
            "/file" => {
                let first = first.ok_or(CommandParseError::MissingArgument {
                    command: "/file",
                    usage: "/file <filename>:<size>:<base64data>",
                })?;
                // file names may contain spaces, take the whole remainder of the line
                let envelope = match rest {
                    Some(rest) => format!("{} {}", first, rest),
                    None => String::from(first),
                };

                UserCommand::SendFile(envelope.parse()?)
            }
            _ => UserCommand::Unknown(name),
        };

        Ok(command)
    }
}

impl fmt::Display for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserCommand::Username(name) => write!(f, "{}{}", USERNAME_PREFIX, name),
            UserCommand::JoinRoom(room) => write!(f, "/join {}", room),
            UserCommand::LeaveRoom => write!(f, "/leave"),
            UserCommand::CreateRoom(room) => write!(f, "/create {}", room),
            UserCommand::PrivateMessage { to, content } => write!(f, "/pm {} {}", to, content),
            UserCommand::ListRooms => write!(f, "/rooms"),
            UserCommand::ListOnline => write!(f, "/online"),
            UserCommand::SendFile(payload) => write!(f, "/file {}", payload),
            UserCommand::Unknown(name) => write!(f, "{}", name),
            UserCommand::Chat(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> UserCommand {
        UserCommand::parse(line).unwrap()
    }

    #[test]
    fn test_username() {
        assert_eq!(parse("USERNAME:alice"), UserCommand::Username("alice".into()));
        assert_eq!(
            UserCommand::parse("USERNAME:"),
            Err(CommandParseError::EmptyUsername)
        );
    }

    #[test]
    fn test_room_commands() {
        assert_eq!(parse("/join General"), UserCommand::JoinRoom("General".into()));
        // extra words after the room name are ignored
        assert_eq!(parse("/join Gaming now"), UserCommand::JoinRoom("Gaming".into()));
        assert_eq!(parse("/leave"), UserCommand::LeaveRoom);
        assert_eq!(parse("/create Books"), UserCommand::CreateRoom("Books".into()));
        assert_eq!(parse("/rooms"), UserCommand::ListRooms);
        assert_eq!(parse("/online"), UserCommand::ListOnline);
    }

    #[test]
    fn test_command_name_is_case_insensitive() {
        assert_eq!(parse("/JOIN General"), UserCommand::JoinRoom("General".into()));
        assert_eq!(parse("/Rooms"), UserCommand::ListRooms);
    }

    #[test]
    fn test_private_message_keeps_spaces_and_colons() {
        assert_eq!(
            parse("/pm bob meet at 10:30: bring snacks"),
            UserCommand::PrivateMessage {
                to: "bob".into(),
                content: "meet at 10:30: bring snacks".into(),
            }
        );
    }

    #[test]
    fn test_missing_arguments() {
        assert!(matches!(
            UserCommand::parse("/join"),
            Err(CommandParseError::MissingArgument { command: "/join", .. })
        ));
        assert!(matches!(
            UserCommand::parse("/create "),
            Err(CommandParseError::MissingArgument { command: "/create", .. })
        ));
        assert!(matches!(
            UserCommand::parse("/pm bob"),
            Err(CommandParseError::MissingArgument { command: "/pm", .. })
        ));
    }

    #[test]
    fn test_file_with_space_in_name() {
        assert_eq!(
            parse("/file holiday photo.png:3:AAEC"),
            UserCommand::SendFile(FilePayload {
                name: "holiday photo.png".into(),
                size: 3,
                data: "AAEC".into(),
            })
        );
    }

    #[test]
    fn test_malformed_file() {
        assert_eq!(
            UserCommand::parse("/file photo.png"),
            Err(CommandParseError::InvalidFile(FileParseError::MissingSegment))
        );
    }

    #[test]
    fn test_unknown_command_and_chat() {
        assert_eq!(parse("/dance now"), UserCommand::Unknown("/dance".into()));
        assert_eq!(parse("hi bob"), UserCommand::Chat("hi bob".into()));
        assert_eq!(parse(""), UserCommand::Chat("".into()));
    }

    #[test]
    fn test_display_matches_wire_format() {
        let lines = [
            "USERNAME:alice",
            "/join General",
            "/leave",
            "/create Books",
            "/pm bob hello: there",
            "/rooms",
            "/online",
            "/file a b.txt:2:aGk=",
            "just chatting",
        ];

        for line in lines {
            assert_eq!(parse(line).to_string(), line);
        }
    }
}
