// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer wire framing: "Envelopes carry opaque binary payloads
//! framed with a length-prefixed contentId header (4-byte big-endian
//! length, UTF-8 id, then body)."
//!
//! Two framing layers (4-byte length prefix + JSON payload) carrying
//! hub-to-hub peer traffic:
//! - [`Envelope::encode`]/[`Envelope::decode`]: the envelope's own header,
//!   carried inside one message.
//! - [`write_message`]/[`read_message`]: the outer stream framing a
//!   [`PeerConnection`](crate::peer::PeerConnection) transport uses to
//!   delimit one message from the next over a byte stream.

use dcc_core::DeviceMessage;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("envelope truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("content id is not valid UTF-8")]
    InvalidContentId,
    #[error("message exceeds maximum frame size of {0} bytes")]
    FrameTooLarge(usize),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Maximum single-frame size accepted by [`read_message`] before failing
/// fast, guarding against a corrupt or hostile length prefix causing an
/// unbounded allocation.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// An opaque binary payload addressed by a `contentId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub content_id: String,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(content_id: impl Into<String>, body: Vec<u8>) -> Self {
        Self { content_id: content_id.into(), body }
    }

    /// A JSON-encoded [`DeviceMessage`] carried under its own correlation
    /// id (or a fixed id for messages without one, e.g. `Publish`/`Event`).
    pub fn for_message(content_id: impl Into<String>, message: &DeviceMessage) -> Result<Self, WireError> {
        Ok(Self::new(content_id, serde_json::to_vec(message)?))
    }

    pub fn decode_message(&self) -> Result<DeviceMessage, WireError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// `[4-byte BE len(contentId)][contentId bytes][body bytes]`.
    pub fn encode(&self) -> Vec<u8> {
        let id_bytes = self.content_id.as_bytes();
        let mut out = Vec::with_capacity(4 + id_bytes.len() + self.body.len());
        out.extend_from_slice(&(id_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(id_bytes);
        out.extend_from_slice(&self.body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < 4 {
            return Err(WireError::Truncated { expected: 4, actual: bytes.len() });
        }
        let id_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < 4 + id_len {
            return Err(WireError::Truncated { expected: 4 + id_len, actual: bytes.len() });
        }
        let content_id = std::str::from_utf8(&bytes[4..4 + id_len]).map_err(|_| WireError::InvalidContentId)?.to_string();
        let body = bytes[4 + id_len..].to_vec();
        Ok(Self { content_id, body })
    }
}

/// Writes `payload` to `writer` prefixed with its 4-byte big-endian length,
/// the outer stream-framing layer a byte-oriented transport needs to
/// delimit one message from the next.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), WireError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed message from `reader`.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
