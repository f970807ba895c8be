use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;
use crate::types::{RpcRequest, RpcResponse};

/// Writes `request` as one JSON object followed by `\n`.
pub async fn write_request<W>(writer: &mut W, request: &RpcRequest) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(request)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a single response line of at most `max_len` bytes.
///
/// A final line without a trailing newline is still accepted when the peer
/// closes the stream right after writing it.
pub async fn read_response<R>(reader: &mut R, max_len: usize) -> Result<RpcResponse, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let limit = (max_len as u64).saturating_add(1);
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut line)
        .await?;
    if read == 0 {
        return Err(TransportError::Closed);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.len() > max_len {
        return Err(TransportError::FrameTooLarge(max_len));
    }
    let response = serde_json::from_slice(&line)?;
    Ok(response)
}
