//! Handler traits for inbound events

use crate::types::IncomingMessage;

/// Displays a pairing code so the account holder can scan it
pub trait CodeRenderer: Send + Sync {
    fn render(&self, code: &str);
}

/// Receives chat messages that arrive while a command is running.
///
/// Called on the task that drains the event stream, so it must return
/// promptly.
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: &IncomingMessage);
}

/// Default message handler: records the message in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessageHandler;

impl MessageHandler for LogMessageHandler {
    fn on_message(&self, message: &IncomingMessage) {
        tracing::info!(
            from = %message.from,
            id = %message.message_id,
            "Received a message: {}",
            message.body
        );
    }
}
