use comms::{
    command::UserCommand,
    event::{Event, OnlineUser},
    transport,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::StreamExt;

#[tokio::test]
async fn assert_server_client_transport() {
    // bind to any free port to wait for client connection
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind to the port");
    let addr = listener.local_addr().expect("listener has no address");

    let (server_collected_lines, client_collected_events) =
        tokio::join!(execute_server(listener), execute_client(addr));

    assert_eq!(
        server_collected_lines.unwrap(),
        vec![
            "USERNAME:alice".to_string(),
            "/join General".to_string(),
            "hi: everyone".to_string(),
            "/nonsense".to_string(),
        ]
    );

    // every line is parseable on the server side, including unknown commands
    let commands = vec![
        UserCommand::Username("alice".into()),
        UserCommand::JoinRoom("General".into()),
        UserCommand::Chat("hi: everyone".into()),
        UserCommand::Unknown("/nonsense".into()),
    ];
    for (line, expected) in [
        "USERNAME:alice",
        "/join General",
        "hi: everyone",
        "/nonsense",
    ]
    .iter()
    .zip(commands)
    {
        assert_eq!(UserCommand::parse(line).unwrap(), expected);
    }

    assert_eq!(
        client_collected_events.unwrap(),
        vec![
            Event::Rooms(vec!["General".into(), "Gaming".into()]),
            Event::Online(vec![OnlineUser {
                username: "alice".into(),
                room: None,
            }]),
        ]
    );
}

async fn execute_server(listener: TcpListener) -> anyhow::Result<Vec<String>> {
    // accept the only client connection we will have
    let tcp_stream = match listener.accept().await {
        Ok((tcp_stream, _addr)) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to accept client: {}", e)),
    };

    // break the client connection into higher level API for ease of use
    let (mut line_stream, mut event_writer) = transport::server::split_tcp_stream(tcp_stream);
    // store lines received from the client
    let mut collected_lines = Vec::new();

    // welcome the user with the room and online lists
    event_writer
        .write(&Event::Rooms(vec!["General".into(), "Gaming".into()]))
        .await?;
    event_writer
        .write(&Event::Online(vec![OnlineUser {
            username: "alice".into(),
            room: None,
        }]))
        .await?;

    // listen for lines from the client until the connection is closed
    while let Some(result) = line_stream.next().await {
        match result {
            Ok(line) => collected_lines.push(line),
            Err(e) => return Err(anyhow::anyhow!("failed to read line: {}", e)),
        }
    }

    Ok(collected_lines)
}

async fn execute_client(addr: std::net::SocketAddr) -> anyhow::Result<Vec<Event>> {
    // create a client connection to the server
    let tcp_stream = match TcpStream::connect(addr).await {
        Ok(tcp_stream) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to connect to server: {}", e)),
    };

    // break the server connection into higher level API for ease of use
    let (mut event_stream, mut command_writer) = transport::client::split_tcp_stream(tcp_stream);
    // store events received from the server
    let mut collected_events = Vec::new();

    // read the two welcome events from the server
    for _ in 0..2 {
        match event_stream.next().await {
            Some(Ok(event)) => collected_events.push(event),
            // server has sent a line which we could not read or parse
            Some(Err(e)) => return Err(anyhow::anyhow!("could not parse event: {}", e)),
            None => return Err(anyhow::anyhow!("server closed the connection")),
        }
    }

    command_writer
        .write(&UserCommand::Username("alice".into()))
        .await?;
    command_writer
        .write(&UserCommand::JoinRoom("General".into()))
        .await?;
    command_writer
        .write(&UserCommand::Chat("hi: everyone".into()))
        .await?;
    // a windows style terminator is accepted as well
    command_writer.write_line("/nonsense\r").await?;

    Ok(collected_events)
}
