/// Lines a client can send, parsed into commands the server can process
pub mod command;
/// Tagged lines the server sends to its clients
pub mod event;
/// Base64 file envelope shared into rooms
pub mod file;
/// Implementation of event and command transportation over TCP Streams.
/// Requires 'server' or 'client' features to be enabled and will bring in tokio dependency alongside with other dependencies
pub mod transport;
