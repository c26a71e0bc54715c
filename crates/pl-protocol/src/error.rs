//! Protocol error types

use thiserror::Error;

/// Errors that can occur while framing bridge traffic
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Unknown message type
    #[error("Unknown message type: {0:#04x}")]
    UnknownMessageType(u8),

    /// Header type byte disagrees with the decoded payload
    #[error("Message type mismatch: header says {header:?}, payload is {payload:?}")]
    TypeMismatch {
        header: crate::MessageType,
        payload: crate::MessageType,
    },

    /// Payload does not fit the 24-bit length field
    #[error("Payload of {size} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// Payload bytes are not a valid message
    #[error("Malformed payload: {0}")]
    Serialization(#[from] bincode::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
