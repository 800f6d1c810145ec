//! Message codec for the MCP stdio transport.
//!
//! Message format:
//! ```text
//! ┌──────────────────────────────┬────┐
//! │   JSON-RPC 2.0 object (UTF-8)│ \n │
//! └──────────────────────────────┴────┘
//! ```
//! One message per line. Lines longer than the configured cap are skipped
//! up to the next newline and reported as [`Frame::Oversized`].

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One line read from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(String),
    /// Line exceeded the cap; carries the number of bytes discarded.
    Oversized(usize),
}

/// Read one line from the stream.
///
/// Returns `None` on clean EOF. A final line without a trailing newline is
/// still returned.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_message_bytes: usize,
) -> std::io::Result<Option<Frame>> {
    let mut line = Vec::new();
    let mut discarded: Option<usize> = None;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if line.is_empty() && discarded.is_none() {
                return Ok(None);
            }
            break;
        }

        let (chunk, done) = match available.iter().position(|b| *b == b'\n') {
            Some(i) => (&available[..i], true),
            None => (available, false),
        };
        let chunk_len = chunk.len();

        match discarded.as_mut() {
            Some(count) => *count += chunk_len,
            None if line.len() + chunk_len > max_message_bytes => {
                discarded = Some(line.len() + chunk_len);
                line.clear();
            }
            None => line.extend_from_slice(chunk),
        }

        reader.consume(if done { chunk_len + 1 } else { chunk_len });
        if done {
            break;
        }
    }

    if let Some(count) = discarded {
        return Ok(Some(Frame::Oversized(count)));
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map(|s| Some(Frame::Message(s)))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Write one message followed by a newline.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &Value,
) -> std::io::Result<()> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
