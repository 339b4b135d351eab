use std::sync::Arc;

use comms::transport;
use nanoid::nanoid;
use tokio::{
    net::TcpStream,
    sync::{broadcast, mpsc},
};
use tokio_stream::StreamExt;

use crate::broker::Broker;

pub use self::chat_session::{ChatSession, SessionState};

mod chat_session;

/// Given a tcp stream and a broker, handles the user session
/// until the tcp stream is closed for some reason, or the server shuts down
pub async fn handle_user_session(
    broker: Arc<Broker>,
    mut quit_rx: broadcast::Receiver<()>,
    stream: TcpStream,
) -> anyhow::Result<()> {
    let session_id = nanoid!();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_default();
    // Split the tcp stream into a line stream and an event writer with better ergonomics
    let (mut lines, mut event_writer) = transport::server::split_tcp_stream(stream);
    // Replies and broadcasts for this session are queued here and written in order
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    tracing::info!(%session_id, %peer, "client connected");
    let mut chat_session = ChatSession::connect(&session_id, broker, outbound_tx).await;

    let result = loop {
        tokio::select! {
            line = lines.next() => match line {
                Some(Ok(line)) => chat_session.handle_line(&line).await,
                // The client closed the tcp stream
                None => break Ok(()),
                Some(Err(err)) => break Err(err),
            },
            // Events from the broker and replies from the chat session are sent to the user
            Some(event) = outbound_rx.recv() => {
                if let Err(err) = event_writer.write(&event).await {
                    break Err(err);
                }
            }
            // If the server is shutting down, we can just close the tcp streams
            // and exit the session handler. Since the server is shutting down,
            // we don't need to notify other users about the user's departure or cleanup resources
            Ok(_) = quit_rx.recv() => {
                drop(event_writer);
                tracing::debug!(%session_id, "gracefully shutting down user tcp stream");
                return Ok(());
            }
        }
    };

    // Replies to lines read before the client closed its side are still owed to it,
    // a client which half-closes keeps reading until we close ours
    if result.is_ok() {
        while let Ok(event) = outbound_rx.try_recv() {
            if event_writer.write(&event).await.is_err() {
                break;
            }
        }
    }

    // Whatever ended the connection, the other users need to learn about the departure
    if let Err(err) = &result {
        tracing::info!(%session_id, username = ?chat_session.username(), "connection lost: {:#}", err);
    }
    chat_session.disconnect().await;

    result
}
