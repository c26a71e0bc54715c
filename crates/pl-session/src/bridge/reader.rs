//! Bridge read loop
//!
//! Owns the read half of the connection. Replies are matched to pending
//! requests by request id; unsolicited frames become [`InboundEvent`]s.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use pl_core::time::current_time_millis;
use pl_core::traits::InboundEvent;
use pl_core::{CredentialStore, DeviceId, DeviceIdentity, IncomingMessage, SessionMaterial};
use pl_protocol::{Frame, Message};

use super::connector::{FrameSink, FrameSource, PendingRequests};

pub(super) async fn read_loop(
    mut source: FrameSource,
    writer: FrameSink,
    events: mpsc::Sender<InboundEvent>,
    store: CredentialStore,
    pending: PendingRequests,
) {
    while let Some(frame) = source.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Protocol error from bridge: {}", e);
                break;
            }
        };

        if !frame.request_id.is_unsolicited() {
            match pending.lock().await.remove(&frame.request_id) {
                Some(reply) => {
                    let _ = reply.send(frame.message);
                }
                None => tracing::warn!("Reply for unknown request {}", frame.request_id),
            }
            continue;
        }

        let Some(event) = handle_frame(frame.message, &writer, &store).await else {
            continue;
        };

        if events.send(event).await.is_err() {
            tracing::trace!("Event receiver gone, dropping event");
        }
    }

    tracing::info!("Bridge connection closed");

    // dropping the reply senders fails every in-flight request
    pending.lock().await.clear();
    let _ = events.try_send(InboundEvent::Disconnected);
}

/// Map one unsolicited message to an event, handling the ones that need
/// no caller involvement in place.
async fn handle_frame(
    message: Message,
    writer: &FrameSink,
    store: &CredentialStore,
) -> Option<InboundEvent> {
    match message {
        Message::PairCode { code } => Some(InboundEvent::PairCode(code)),

        Message::PairSuccess {
            device_id,
            material,
            push_name,
        } => {
            let Some(id) = DeviceId::parse(device_id) else {
                return Some(InboundEvent::PairFailure(
                    "bridge reported an empty device id".to_string(),
                ));
            };
            if let Some(name) = push_name {
                tracing::info!("Paired with account {}", name);
            }

            // persisted before anyone learns pairing succeeded
            let identity =
                DeviceIdentity::new(id.clone(), SessionMaterial::new(material), current_time_millis());
            match store.save(&identity).await {
                Ok(()) => Some(InboundEvent::PairSuccess(id)),
                Err(e) => Some(InboundEvent::PairFailure(format!(
                    "failed to store the new identity: {}",
                    e
                ))),
            }
        }

        Message::PairFailure { reason } => Some(InboundEvent::PairFailure(reason)),

        Message::MaterialUpdate { material } => {
            match store.update_material(&SessionMaterial::new(material)).await {
                Ok(true) => tracing::debug!("Session material updated"),
                Ok(false) => tracing::debug!("Material update with no resident identity"),
                Err(e) => tracing::warn!("Failed to store material update: {}", e),
            }
            None
        }

        Message::Incoming {
            message_id,
            from,
            body,
            timestamp,
        } => Some(InboundEvent::Message(IncomingMessage {
            message_id,
            from,
            body,
            timestamp,
        })),

        Message::Heartbeat { timestamp } => {
            let ack = Frame::unsolicited(Message::HeartbeatAck { timestamp });
            if let Err(e) = writer.lock().await.send(ack).await {
                tracing::debug!("Failed to answer heartbeat: {}", e);
            }
            None
        }

        Message::Error { code, message } => {
            tracing::warn!("Bridge error ({:?}): {}", code, message);
            None
        }

        other => {
            tracing::warn!("Unexpected message from bridge: {:?}", other.message_type());
            None
        }
    }
}
