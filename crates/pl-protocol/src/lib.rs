//! pl-protocol: Wire protocol for the pairlink messaging bridge
//!
//! This crate defines the framed binary protocol spoken between the
//! pairlink client and the bridge that fronts the remote messaging
//! service, plus the participant address format used when sending.

pub mod address;
pub mod codec;
pub mod error;
pub mod frame;
pub mod message;
pub mod request;

pub use address::{AddressError, ParticipantAddress, MAX_USER_DIGITS};
pub use codec::{Frame, FrameCodec};
pub use error::ProtocolError;
pub use frame::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use message::{ErrorCode, Message, MessageType, PROTOCOL_VERSION};
pub use request::RequestId;
