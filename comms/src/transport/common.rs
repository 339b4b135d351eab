use std::pin::Pin;

use tokio_stream::Stream;

/// Every protocol line ends with a single line feed, a trailing `\r` is tolerated when reading
pub const NEW_LINE: &[u8; 1] = b"\n";

pub type BoxedStream<Item> = Pin<Box<dyn Stream<Item = Item> + Send>>;

/// Render a protocol line with its terminator, ready to be written to the socket
pub fn to_line_bytes(line: impl ToString) -> Vec<u8> {
    let mut bytes = line.to_string().into_bytes();
    bytes.extend_from_slice(NEW_LINE);

    bytes
}
