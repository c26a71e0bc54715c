//! `tokio_util` codec turning byte streams into [`Frame`]s and back

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::{FrameHeader, MAX_PAYLOAD_SIZE};
use crate::message::Message;
use crate::request::RequestId;

/// A decoded message together with the request it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Request this frame belongs to
    pub request_id: RequestId,
    /// The message payload
    pub message: Message,
}

impl Frame {
    pub fn new(request_id: RequestId, message: Message) -> Self {
        Self {
            request_id,
            message,
        }
    }

    /// A frame pushed without a matching request
    pub fn unsolicited(message: Message) -> Self {
        Self::new(RequestId::UNSOLICITED, message)
    }
}

/// Length-prefixed bincode framing for [`Frame`]s
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Header decoded on a previous call whose payload has not fully arrived
    pending_header: Option<FrameHeader>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
        if self.pending_header.is_none() {
            self.pending_header = FrameHeader::decode(src)?;
        }
        let Some(header) = self.pending_header else {
            return Ok(None);
        };

        let len = header.payload_length as usize;
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }
        self.pending_header = None;

        let message: Message = bincode::deserialize(&src.split_to(len))?;
        let found = message.message_type();
        if found != header.message_type {
            return Err(ProtocolError::TypeMismatch {
                header: header.message_type,
                payload: found,
            });
        }

        Ok(Some(Frame::new(header.request_id, message)))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = bincode::serialize(&frame.message)?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        FrameHeader::new(
            frame.request_id,
            frame.message.message_type(),
            payload.len() as u32,
        )
        .encode(dst);
        dst.extend_from_slice(&payload);

        Ok(())
    }
}
