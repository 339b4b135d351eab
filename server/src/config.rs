use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::broker::DEFAULT_ROOMS;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9999;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "chat-relay", version, about = "Line based chat relay with rooms, private messages and file sharing", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Room to create at startup, repeat for more rooms (defaults to General, Gaming, Music and Random)
    #[arg(long = "room", value_name = "NAME")]
    pub rooms: Vec<String>,

    /// JSON file with `host`, `port` and `rooms`, command line flags take precedence
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging with targets and thread ids
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid room name '{0}', names must be non-empty and cannot contain spaces, ',' or ':'")]
    InvalidRoomName(String),
}

/// Settings read from the optional JSON config file, every field may be left out
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rooms: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The effective server settings, command line over config file over built-in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rooms: Vec<String>,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let rooms = if !cli.rooms.is_empty() {
            cli.rooms.clone()
        } else {
            file.rooms
                .unwrap_or_else(|| DEFAULT_ROOMS.iter().map(|room| String::from(*room)).collect())
        };

        if let Some(invalid) = rooms.iter().find(|room| !is_valid_room_name(room)) {
            return Err(ConfigError::InvalidRoomName(invalid.clone()));
        }

        Ok(ServerConfig {
            host: cli
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| String::from(DEFAULT_HOST)),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            rooms,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// room names end up in comma separated lists and colon delimited events
fn is_valid_room_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c == ',' || c == ':' || c.is_whitespace())
}
