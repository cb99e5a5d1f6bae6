//! Line framing for control requests.
//!
//! A client sends exactly one command line per connection. The line ends at
//! the first `\n` (an optional preceding `\r` is dropped) or at end of stream.
//! Bytes after the terminator are ignored.

use std::io::{self, Read};

use thiserror::Error;

/// Maximum size of a single command line, terminator included.
pub(crate) const MAX_LINE_BYTES: usize = 64 * 1024;

/// Errors raised while reading a command line.
#[derive(Debug, Error)]
pub(crate) enum FramingError {
    #[error("failed to read command line: {0}")]
    Io(#[from] io::Error),
    #[error("command line of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("command line contains a NUL byte at offset {offset}")]
    NulByte { offset: usize },
}

/// Reads one bounded command line from `reader`.
///
/// Returns `Ok(None)` when the peer disconnects without sending anything.
/// Invalid UTF-8 is replaced rather than rejected.
pub(crate) fn read_command_line<R: Read>(reader: &mut R) -> Result<Option<String>, FramingError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = read_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return finish_line(buffer).map(Some);
        }

        let received = &chunk[..bytes_read];
        if let Some(newline) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(&received[..newline]);
            enforce_limit(buffer.len() + 1)?;
            return finish_line(buffer).map(Some);
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len())?;
    }
}

fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize) -> Result<(), FramingError> {
    if size > MAX_LINE_BYTES {
        return Err(FramingError::TooLarge {
            size,
            limit: MAX_LINE_BYTES,
        });
    }
    Ok(())
}

fn finish_line(mut line: Vec<u8>) -> Result<String, FramingError> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    if let Some(offset) = line.iter().position(|byte| *byte == 0) {
        return Err(FramingError::NulByte { offset });
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
