//! Frame header
//!
//! Layout (8 bytes, network order):
//!
//! ```text
//! 0      4      5           8
//! +------+------+-----------+
//! | req  | type |  length   |
//! | u32  |  u8  |    u24    |
//! +------+------+-----------+
//! ```
//!
//! `req` is 0 for frames nobody asked for (pairing codes, incoming
//! messages, heartbeats).

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::message::MessageType;
use crate::request::RequestId;

pub const HEADER_SIZE: usize = 8;

/// Largest payload the 24-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = (1 << 24) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub request_id: RequestId,
    pub message_type: MessageType,
    /// Payload bytes following the header
    pub payload_length: u32,
}

impl FrameHeader {
    pub fn new(request_id: RequestId, message_type: MessageType, payload_length: u32) -> Self {
        Self {
            request_id,
            message_type,
            payload_length,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let id = self.request_id.as_u32().to_be_bytes();
        let len = self.payload_length.to_be_bytes();
        [id[0], id[1], id[2], id[3], self.message_type.as_u8(), len[1], len[2], len[3]]
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.extend_from_slice(&self.to_bytes());
    }

    /// Consume a header from the front of `src`.
    ///
    /// Returns `Ok(None)` while fewer than [`HEADER_SIZE`] bytes are
    /// buffered. Nothing is consumed unless a header is returned.
    pub fn decode(src: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        let Some(raw) = src.get(..HEADER_SIZE) else {
            return Ok(None);
        };

        let message_type =
            MessageType::from_u8(raw[4]).ok_or(ProtocolError::UnknownMessageType(raw[4]))?;
        let request_id = RequestId::new(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
        let payload_length = u32::from_be_bytes([0, raw[5], raw[6], raw[7]]);

        src.advance(HEADER_SIZE);
        Ok(Some(Self::new(request_id, message_type, payload_length)))
    }
}
