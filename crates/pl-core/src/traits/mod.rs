//! Seams between the session lifecycle and its collaborators

mod handlers;
mod transport;

pub use handlers::{CodeRenderer, LogMessageHandler, MessageHandler};
pub use transport::{Connector, Handshake, InboundEvent, Transport};
