//! DAP wire framing.
//!
//! Each frame is `Content-Length: N\r\n\r\n` followed by N bytes of JSON.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::DapError;
use crate::protocol::Message;

/// Read one framed DAP message.
///
/// Returns [`DapError::Closed`] on a clean end of stream. Malformed
/// framing, invalid JSON, and zero sequence numbers are fatal per-stream
/// errors; the caller is expected to stop reading.
pub async fn read_message<R>(reader: &mut R) -> Result<Message, DapError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;

    // Header lines until the blank separator.
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(DapError::Closed);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            let value = value.trim();
            content_length = Some(value.parse().map_err(|_| {
                DapError::Frame(format!("invalid Content-Length value '{value}'"))
            })?);
        }
    }

    let length =
        content_length.ok_or_else(|| DapError::Frame("missing Content-Length header".into()))?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    let msg: Message = serde_json::from_slice(&body)?;
    if msg.seq() == 0 {
        return Err(DapError::Frame("message has no sequence number".into()));
    }
    Ok(msg)
}

/// Frame and write one DAP message, then flush.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> Result<(), DapError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(msg)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}
