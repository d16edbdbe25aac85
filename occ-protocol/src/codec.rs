//! Newline-delimited JSON framing
//!
//! One JSON document per line. A connection carries exactly one request
//! frame and at most one reply frame.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const DELIMITER: u8 = b'\n';

/// Read one frame and decode it as `T`
pub async fn read_frame<R, T>(reader: &mut R, max_frame_bytes: usize) -> Result<T>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = Vec::new();
    let limit = max_frame_bytes as u64 + 1;
    let read = (&mut *reader)
        .take(limit)
        .read_until(DELIMITER, &mut buf)
        .await?;

    if read == 0 {
        return Err(Error::Malformed(
            "connection closed before a frame arrived".to_string(),
        ));
    }

    if buf.last() == Some(&DELIMITER) {
        buf.pop();
    } else if buf.len() > max_frame_bytes {
        return Err(Error::Malformed(format!(
            "frame exceeds {} bytes",
            max_frame_bytes
        )));
    }

    serde_json::from_slice(&buf).map_err(|e| Error::Malformed(e.to_string()))
}

/// Encode `message` and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(message)?;
    buf.push(DELIMITER);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
