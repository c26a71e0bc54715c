//! Message types for the bridge protocol
//!
//! # Message Flow
//!
//! Pairing a fresh device:
//!
//! 1. Client connects and sends `Hello`
//! 2. Bridge pushes `PairCode` repeatedly; each code supersedes the last
//! 3. Once the code is scanned the bridge sends `PairSuccess` carrying the
//!    new device identifier and its session material, or `PairFailure`
//!
//! Reconnecting a paired device:
//!
//! 1. Client connects and sends `Resume` with the stored identity
//! 2. Bridge answers `ResumeAck`; `accepted: false` means the material was
//!    revoked or expired and the device must pair again
//!
//! While connected the bridge may push `Incoming`, `MaterialUpdate` and
//! `Heartbeat` at any time. `SendText` and `Revoke` are requests: the
//! bridge answers with `SendAck`/`RevokeAck` or `Error` under the same
//! request id.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Current protocol version string, sent in `Hello`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Message type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Hello = 0x01,
    Resume = 0x02,
    ResumeAck = 0x03,
    PairCode = 0x04,
    PairSuccess = 0x05,
    PairFailure = 0x06,
    MaterialUpdate = 0x07,
    SendText = 0x08,
    SendAck = 0x09,
    Revoke = 0x0A,
    RevokeAck = 0x0B,
    Incoming = 0x0C,
    Heartbeat = 0x0D,
    HeartbeatAck = 0x0E,
    Error = 0xFF,
}

impl MessageType {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Hello),
            0x02 => Some(Self::Resume),
            0x03 => Some(Self::ResumeAck),
            0x04 => Some(Self::PairCode),
            0x05 => Some(Self::PairSuccess),
            0x06 => Some(Self::PairFailure),
            0x07 => Some(Self::MaterialUpdate),
            0x08 => Some(Self::SendText),
            0x09 => Some(Self::SendAck),
            0x0A => Some(Self::Revoke),
            0x0B => Some(Self::RevokeAck),
            0x0C => Some(Self::Incoming),
            0x0D => Some(Self::Heartbeat),
            0x0E => Some(Self::HeartbeatAck),
            0xFF => Some(Self::Error),
            _ => None,
        }
    }
}

/// Error codes carried by `Message::Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    Unknown = 0,
    /// Request needs an authenticated session
    NotAuthenticated = 1,
    /// Recipient is not a registered participant
    UnknownRecipient = 2,
    /// The remote service refused the request
    Rejected = 3,
    /// The bridge could not reach the remote service
    Unavailable = 4,
    InvalidMessage = 5,
}

/// Protocol messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Start a session for a device that has no identity yet
    Hello {
        /// Name shown in the account holder's linked-device list
        device_name: String,
        /// Operating system of the client
        os: String,
        /// Protocol version, see [`PROTOCOL_VERSION`]
        #[serde(default)]
        version: Option<String>,
    },

    /// Resume a session for a previously paired device
    Resume { device_id: String, material: Bytes },

    /// Verdict on a `Resume`
    ResumeAck {
        accepted: bool,
        reason: Option<String>,
    },

    /// A freshly issued scannable pairing code
    PairCode { code: String },

    /// The account holder approved the pairing
    PairSuccess {
        device_id: String,
        material: Bytes,
        push_name: Option<String>,
    },

    /// Pairing ended without success (rejected, timed out remotely)
    PairFailure { reason: String },

    /// The bridge rotated the session material
    MaterialUpdate { material: Bytes },

    /// Deliver a text message
    SendText { to: String, body: String },

    /// The message was accepted by the remote service
    SendAck { message_id: String, timestamp: u64 },

    /// Unlink this device from the account
    Revoke,

    /// The device was unlinked
    RevokeAck,

    /// A chat message addressed to this device
    Incoming {
        message_id: String,
        from: String,
        body: String,
        timestamp: u64,
    },

    /// Liveness probe from the bridge
    Heartbeat { timestamp: u64 },

    /// Echo of a heartbeat
    HeartbeatAck { timestamp: u64 },

    /// Error response
    Error { code: ErrorCode, message: String },
}

impl Message {
    /// Get the message type for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Hello { .. } => MessageType::Hello,
            Message::Resume { .. } => MessageType::Resume,
            Message::ResumeAck { .. } => MessageType::ResumeAck,
            Message::PairCode { .. } => MessageType::PairCode,
            Message::PairSuccess { .. } => MessageType::PairSuccess,
            Message::PairFailure { .. } => MessageType::PairFailure,
            Message::MaterialUpdate { .. } => MessageType::MaterialUpdate,
            Message::SendText { .. } => MessageType::SendText,
            Message::SendAck { .. } => MessageType::SendAck,
            Message::Revoke => MessageType::Revoke,
            Message::RevokeAck => MessageType::RevokeAck,
            Message::Incoming { .. } => MessageType::Incoming,
            Message::Heartbeat { .. } => MessageType::Heartbeat,
            Message::HeartbeatAck { .. } => MessageType::HeartbeatAck,
            Message::Error { .. } => MessageType::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_byte_mapping() {
        for msg_type in [
            MessageType::Hello,
            MessageType::Resume,
            MessageType::ResumeAck,
            MessageType::PairCode,
            MessageType::PairSuccess,
            MessageType::PairFailure,
            MessageType::MaterialUpdate,
            MessageType::SendText,
            MessageType::SendAck,
            MessageType::Revoke,
            MessageType::RevokeAck,
            MessageType::Incoming,
            MessageType::Heartbeat,
            MessageType::HeartbeatAck,
            MessageType::Error,
        ] {
            assert_eq!(MessageType::from_u8(msg_type.as_u8()), Some(msg_type));
        }
        assert_eq!(MessageType::from_u8(0x42), None);
    }

    #[test]
    fn test_message_type_of_unit_variants() {
        assert_eq!(Message::Revoke.message_type(), MessageType::Revoke);
        assert_eq!(Message::RevokeAck.message_type(), MessageType::RevokeAck);
    }
}
