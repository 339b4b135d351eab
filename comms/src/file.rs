use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// Errors which can occur while reading a `name:size:data` file envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileParseError {
    #[error("file payload must look like <filename>:<size>:<base64data>")]
    MissingSegment,
    #[error("file name cannot be empty")]
    EmptyName,
    #[error("file size '{0}' is not a number")]
    InvalidSize(String),
}

/// A file shared into a room.
///
/// The payload travels as standard base64 text inside a single protocol line,
/// the server relays it untouched and only the receiving client decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    /// Name of the file without any directory component
    pub name: String,
    /// Size of the original file in bytes, as claimed by the sender
    pub size: u64,
    /// Base64 encoded content
    pub data: String,
}

impl FilePayload {
    /// Encode raw file content into a payload ready to be sent
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Self {
        FilePayload {
            name: String::from(name),
            size: bytes.len() as u64,
            data: STANDARD.encode(bytes),
        }
    }

    /// Decode the base64 content back into the original bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.as_bytes())
    }
}

impl FromStr for FilePayload {
    type Err = FileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (name, size, data) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(size), Some(data)) => (name, size, data),
            _ => return Err(FileParseError::MissingSegment),
        };

        if name.is_empty() {
            return Err(FileParseError::EmptyName);
        }

        let size = size
            .parse::<u64>()
            .map_err(|_| FileParseError::InvalidSize(String::from(size)))?;

        Ok(FilePayload {
            name: String::from(name),
            size,
            data: String::from(data),
        })
    }
}

impl fmt::Display for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.size, self.data)
    }
}
