use std::time::Duration;

use comms::{command::UserCommand, event::Event, transport};
use nanoid::nanoid;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use tokio::{net::TcpStream, task::JoinSet};
use tokio_stream::StreamExt;

/// Stress Test for the Chat Relay
///
/// Generates synthetic load with users who hop between random rooms, chat and send private messages.
/// The number of users, how often they switch rooms and chattiness of users can be configured.
///
/// !IMPORTANT! Be sure to check and configure your socket limits, before you run the tests

const SERVER_ADDR: &str = "localhost:9999";

/// Stress Test Configuration
// The number of users to spawn, distributed across the load increments
const LOAD_INCREMENTS: &str = r#"[
    { "user_count": 200, "after": { "secs": 30, "nanos": 0 }, "steps": 30 },
    { "user_count": 400, "after": { "secs": 60, "nanos": 0 }, "steps": 30 }
]"#;
// Every how many messages a user moves to another room
const MESSAGES_PER_ROOM: usize = 10;
// How many milliseconds to wait between each user message
const USER_CHAT_DELAY_MILLIS: u64 = 2_000;

#[derive(Debug, Clone, Deserialize)]
struct LoadIncrements {
    user_count: usize,
    after: Duration,
    steps: usize,
}

async fn spawn_single_user(user_index: usize) -> anyhow::Result<()> {
    let result = spawn_single_user_raw(user_index).await;

    if let Err(err) = result.as_ref() {
        println!("user {} failed: {:#}", user_index, err);
    }

    result
}

async fn spawn_single_user_raw(user_index: usize) -> anyhow::Result<()> {
    let tcp_stream = TcpStream::connect(SERVER_ADDR).await?;
    let (mut event_stream, mut command_writer) = transport::client::split_tcp_stream(tcp_stream);
    let username = format!("load-{}", user_index);

    command_writer
        .write(&UserCommand::Username(username.clone()))
        .await?;

    let rooms = match event_stream.next().await {
        Some(Ok(Event::Rooms(rooms))) if !rooms.is_empty() => rooms,
        _ => return Err(anyhow::anyhow!("server did not send the room list")),
    };

    let join_handle = tokio::spawn({
        let mut rng = StdRng::from_entropy();
        let to_sleep = Duration::from_millis(USER_CHAT_DELAY_MILLIS);

        async move {
            // sleep initially for a time to distribute the messaging times
            tokio::time::sleep(Duration::from_millis(
                rng.gen_range(1..USER_CHAT_DELAY_MILLIS),
            ))
            .await;

            let mut sent = 0usize;
            loop {
                if sent % MESSAGES_PER_ROOM == 0 {
                    let room = rooms[rng.gen_range(0..rooms.len())].clone();
                    let _ = command_writer.write(&UserCommand::JoinRoom(room)).await;
                }

                let command = if rng.gen_bool(0.1) {
                    UserCommand::PrivateMessage {
                        to: format!("load-{}", rng.gen_range(0..=user_index)),
                        content: nanoid!(),
                    }
                } else {
                    UserCommand::Chat(nanoid!())
                };
                if command_writer.write(&command).await.is_err() {
                    break;
                }

                sent += 1;
                tokio::time::sleep(to_sleep).await;
            }
        }
    });

    while let Some(event) = event_stream.next().await {
        if let Err(err) = event {
            println!("{} received an unparseable line: {:#}", username, err);
        }
    }

    join_handle.abort();
    Ok(())
}

#[tokio::main]
async fn main() {
    let load_increments: Vec<LoadIncrements> =
        serde_json::from_str(LOAD_INCREMENTS).expect("could not parse the load increments");

    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

    let mut current: usize = 0;
    for li in load_increments {
        let diff = li.user_count - current;
        let sleep_duration =
            Duration::from_millis((li.after.as_millis() / li.steps as u128) as u64);
        let to_increment = diff / li.steps;

        for _ in 0..li.steps {
            for i in 0..to_increment {
                join_set.spawn(spawn_single_user(current + i));
            }

            current += to_increment;
            println!("total users: {}", current);
            tokio::time::sleep(sleep_duration).await;
        }
    }

    while join_set.join_next().await.is_some() {}
}
