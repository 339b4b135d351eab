/// Shared registry of rooms and sessions, every fan-out goes through it
pub mod broker;
/// Command line and config file handling
pub mod config;
/// Accept loop spawning one task per connection
pub mod listener;
pub mod logging;
/// Per connection protocol handling
pub mod session;
