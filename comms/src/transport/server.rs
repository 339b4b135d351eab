use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
};
use tokio_stream::{wrappers::SplitStream, StreamExt};

use crate::event;

use super::common::{to_line_bytes, BoxedStream, NEW_LINE};

/// [LineStream] is a stream of raw lines sent by the client
///
/// Lines are not parsed here, a line which is not a valid [crate::command::UserCommand]
/// is a protocol error to be answered by the session and must not end the stream.
/// Invalid UTF-8 is replaced with `U+FFFD`, only socket failures surface as errors.
///
/// # Cancel Safety
///
/// This stream is cancel-safe, meaning that it can be used in [tokio::select!]
/// without the risk of missing lines.
pub type LineStream = BoxedStream<anyhow::Result<String>>;

/// [EventWriter] is a wrapper around a [TcpStream] which writes [crate::event::Event]s to the client
pub struct EventWriter {
    writer: OwnedWriteHalf,
}

impl EventWriter {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send a [crate::event::Event] to the backing [TcpStream] as a single line
    ///
    /// # Cancel Safety
    ///
    /// This method is not cancellation safe. If it is used as the event
    /// in a [tokio::select!] statement and some other
    /// branch completes first, then the provided [crate::event::Event] may have been
    /// partially written, but future calls to `write` will start over
    /// from the beginning of the buffer. Causing undefined behaviour.
    pub async fn write(&mut self, event: &event::Event) -> anyhow::Result<()> {
        self.writer
            .write_all(to_line_bytes(event).as_slice())
            .await
            .context("could not write event to the client")?;

        Ok(())
    }
}

/// Splits a TCP stream into a stream of lines and an event writer.
///
/// # Arguments
///
/// - `stream` - A [TcpStream] to split
pub fn split_tcp_stream(stream: TcpStream) -> (LineStream, EventWriter) {
    let (reader, writer) = stream.into_split();

    (
        Box::pin(
            SplitStream::new(BufReader::new(reader).split(NEW_LINE[0])).map(|line| {
                line.map(|bytes| decode_line(&bytes))
                    .context("could not read line from the client")
            }),
        ),
        EventWriter::new(writer),
    )
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_strips_carriage_return() {
        assert_eq!(decode_line(b"/rooms\r"), "/rooms");
        assert_eq!(decode_line(b"hello"), "hello");
        assert_eq!(decode_line(b""), "");
    }

    #[test]
    fn test_decode_line_replaces_invalid_utf8() {
        assert_eq!(decode_line(b"caf\xe9"), "caf\u{FFFD}");
        assert_eq!(decode_line("café\r".as_bytes()), "café");
    }
}
