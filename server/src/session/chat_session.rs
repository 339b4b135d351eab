use std::sync::Arc;

use comms::{command::UserCommand, event::Event, file::FilePayload};

use crate::broker::{Broker, BrokerError, Outbound, SessionId};

/// Where a session is in its lifecycle, a closed session no longer exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered,
    InRoom,
}

/// [ChatSession] is the protocol state machine of a single connection.
///
/// It interprets the lines sent by the client and turns them into broker calls.
/// Replies travel through the same outbound queue as broadcasts, so the client
/// sees them in the order they were produced.
pub struct ChatSession {
    session_id: SessionId,
    username: Option<String>,
    current_room: Option<String>,
    broker: Arc<Broker>,
    outbound: Outbound,
}

impl ChatSession {
    /// Register a new connection with the broker
    pub async fn connect(session_id: &str, broker: Arc<Broker>, outbound: Outbound) -> Self {
        if !broker.register(session_id, outbound.clone()).await {
            tracing::warn!(session_id, "session id collision, keeping the existing entry");
        }

        ChatSession {
            session_id: String::from(session_id),
            username: None,
            current_room: None,
            broker,
            outbound,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    pub fn state(&self) -> SessionState {
        match (&self.username, &self.current_room) {
            (None, _) => SessionState::Unregistered,
            (Some(_), None) => SessionState::Registered,
            (Some(_), Some(_)) => SessionState::InRoom,
        }
    }

    /// Handle a single line received from the client
    ///
    /// Protocol problems are answered with a `SYSTEM:` reply and never end the session.
    pub async fn handle_line(&mut self, line: &str) {
        tracing::trace!(session_id = %self.session_id, username = ?self.username, line, "received line");

        match UserCommand::parse(line) {
            Ok(cmd) => self.handle_user_command(cmd).await,
            Err(err) => self.reply(Event::system(err.to_string())),
        }
    }

    pub async fn handle_user_command(&mut self, cmd: UserCommand) {
        let username = match (&cmd, self.username.clone()) {
            (UserCommand::Username(name), _) => {
                self.register(name).await;
                return;
            }
            (_, Some(username)) => username,
            // chat without a room is dropped, a session without a name has no room
            (UserCommand::Chat(_), None) => return,
            (_, None) => {
                self.reply(Event::system(
                    "Please register first with USERNAME:<name>",
                ));
                return;
            }
        };

        match cmd {
            UserCommand::Username(_) => {}
            UserCommand::JoinRoom(room) => self.join_room(&room).await,
            UserCommand::LeaveRoom => {
                if let Some(room) = self.broker.leave_room(&self.session_id).await {
                    self.current_room = None;
                    self.reply(Event::Left(room));
                }
            }
            UserCommand::CreateRoom(room) => {
                if self.broker.create_room(&room).await {
                    self.broker
                        .broadcast_to_all(Event::RoomCreated(room.clone()))
                        .await;
                }
                self.reply(self.broker.room_list().await);
            }
            UserCommand::PrivateMessage { to, content } => {
                self.send_private_message(&username, to, content).await
            }
            UserCommand::ListRooms => self.reply(self.broker.room_list().await),
            UserCommand::ListOnline => self.reply(self.broker.online_list().await),
            UserCommand::SendFile(file) => self.share_file(&username, file).await,
            UserCommand::Unknown(name) => {
                self.reply(Event::system(format!("Unknown command: {}", name)))
            }
            UserCommand::Chat(content) => {
                if let Some(room) = &self.current_room {
                    self.broker
                        .broadcast_to_room(
                            room,
                            Event::Message {
                                room: room.clone(),
                                sender: username,
                                content,
                            },
                        )
                        .await;
                }
            }
        }
    }

    /// Name the session and announce it to everyone
    ///
    /// Sending a name again renames the session, the broker keeps a single entry per connection.
    async fn register(&mut self, username: &str) {
        match self.broker.set_username(&self.session_id, username).await {
            Ok(Some(previous)) => {
                tracing::info!(session_id = %self.session_id, %previous, username, "user renamed")
            }
            Ok(None) => tracing::info!(session_id = %self.session_id, username, "user registered"),
            Err(err) => {
                tracing::warn!(session_id = %self.session_id, %err, "could not register user");
                return;
            }
        }
        self.username = Some(String::from(username));

        self.reply(self.broker.room_list().await);
        self.reply(self.broker.online_list().await);
        self.broker
            .broadcast_to_all(Event::UserJoined(String::from(username)))
            .await;
        self.broker
            .broadcast_to_all(self.broker.online_list().await)
            .await;
    }

    async fn join_room(&mut self, room: &str) {
        match self.broker.join_room(&self.session_id, room).await {
            Ok(_) => {
                self.current_room = Some(String::from(room));
                self.reply(Event::Joined(String::from(room)));
                self.reply(self.broker.online_list().await);
            }
            Err(err @ BrokerError::RoomNotFound(_)) => self.reply(Event::system(err.to_string())),
            Err(err) => tracing::warn!(session_id = %self.session_id, %err, "could not join room"),
        }
    }

    async fn send_private_message(&self, username: &str, to: String, content: String) {
        let delivered = match self.broker.find_by_username(&to).await {
            Some(target) => {
                self.broker
                    .send_to(
                        &target,
                        Event::PrivateMessage {
                            from: String::from(username),
                            content: content.clone(),
                        },
                    )
                    .await
            }
            None => false,
        };

        if delivered {
            self.reply(Event::PrivateMessageSent { to, content });
        } else {
            self.reply(Event::system(format!("User not found: {}", to)));
        }
    }

    async fn share_file(&self, username: &str, file: FilePayload) {
        let Some(room) = &self.current_room else {
            self.reply(Event::system("Join a room before sending files"));
            return;
        };

        tracing::info!(
            session_id = %self.session_id,
            username,
            %room,
            file = %file.name,
            size = file.size,
            "file shared"
        );

        self.broker
            .broadcast_to_room(
                room,
                Event::File {
                    room: room.clone(),
                    sender: String::from(username),
                    file,
                },
            )
            .await;
    }

    /// Tear the session down after the connection is gone
    ///
    /// The current room hears about the departure first, then everyone gets the
    /// updated presence. A session which never picked a name leaves silently.
    pub async fn disconnect(self) {
        self.broker.leave_room(&self.session_id).await;
        self.broker.unregister(&self.session_id).await;

        if let Some(username) = self.username {
            tracing::info!(session_id = %self.session_id, %username, "user disconnected");

            self.broker
                .broadcast_to_all(Event::UserLeft(username))
                .await;
            self.broker
                .broadcast_to_all(self.broker.online_list().await)
                .await;
        }
    }

    fn reply(&self, event: Event) {
        // the receiving half lives as long as the connection task, a failure means it is shutting down
        let _ = self.outbound.send(event);
    }
}
