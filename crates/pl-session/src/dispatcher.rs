//! Inbound event routing
//!
//! Chat messages go straight to the [`MessageHandler`] in arrival order.
//! Pairing events are handed back to whoever is driving the connection,
//! normally the [`PairingCoordinator`](crate::pairing::PairingCoordinator).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use pl_core::traits::{InboundEvent, MessageHandler};
use pl_core::DeviceId;

/// Pairing-related events surfaced by [`EventDispatcher::next_pairing_event`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingEvent {
    Code(String),
    Success(DeviceId),
    Failure(String),
}

enum Routed {
    Pairing(PairingEvent),
    Delivered,
    Closed,
}

/// Sole consumer of one connection's event stream
pub struct EventDispatcher {
    events: mpsc::Receiver<InboundEvent>,
    message_handler: Arc<dyn MessageHandler>,
    closed: bool,
    delivered: usize,
}

impl EventDispatcher {
    pub fn new(events: mpsc::Receiver<InboundEvent>, message_handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            events,
            message_handler,
            closed: false,
            delivered: 0,
        }
    }

    /// Number of chat messages handed to the message handler so far
    pub fn messages_delivered(&self) -> usize {
        self.delivered
    }

    /// Whether the underlying stream has ended
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Wait for the next pairing event, delivering chat messages on the way.
    ///
    /// Returns `None` once the stream is closed. Cancel safe.
    pub async fn next_pairing_event(&mut self) -> Option<PairingEvent> {
        while !self.closed {
            let event = self.events.recv().await;
            if let Routed::Pairing(event) = self.route(event) {
                return Some(event);
            }
        }
        None
    }

    /// Keep delivering chat messages until `deadline`.
    ///
    /// Always returns at the deadline, even if the stream closes earlier.
    /// Pairing events arriving here are logged and dropped.
    pub async fn pump_until(&mut self, deadline: Instant) {
        while !self.closed {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(event) => {
                    if let Routed::Pairing(event) = self.route(event) {
                        tracing::debug!("Ignoring late pairing event: {:?}", event);
                    }
                }
                Err(_) => return,
            }
        }
        tokio::time::sleep_until(deadline).await;
    }

    /// Drive `request` to completion while delivering chat messages.
    ///
    /// The transport's reader cannot reach a reply while the event queue
    /// is full, so the queue has to keep moving until the reply arrives.
    /// Pairing events arriving here are logged and dropped.
    pub async fn serve<F: Future>(&mut self, request: F) -> F::Output {
        tokio::pin!(request);
        loop {
            tokio::select! {
                biased;
                output = &mut request => return output,
                event = self.events.recv(), if !self.closed => {
                    if let Routed::Pairing(event) = self.route(event) {
                        tracing::debug!("Ignoring pairing event outside pairing: {:?}", event);
                    }
                }
            }
        }
    }

    /// Deliver whatever is already queued without waiting.
    ///
    /// Returns the number of chat messages delivered.
    pub fn drain(&mut self) -> usize {
        let before = self.delivered;
        while !self.closed {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Routed::Pairing(event) = self.route(Some(event)) {
                        tracing::debug!("Ignoring pairing event outside pairing: {:?}", event);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => self.closed = true,
            }
        }
        self.delivered - before
    }

    fn route(&mut self, event: Option<InboundEvent>) -> Routed {
        match event {
            Some(InboundEvent::Message(message)) => {
                self.message_handler.on_message(&message);
                self.delivered += 1;
                Routed::Delivered
            }
            Some(InboundEvent::PairCode(code)) => Routed::Pairing(PairingEvent::Code(code)),
            Some(InboundEvent::PairSuccess(id)) => Routed::Pairing(PairingEvent::Success(id)),
            Some(InboundEvent::PairFailure(reason)) => {
                Routed::Pairing(PairingEvent::Failure(reason))
            }
            Some(InboundEvent::Disconnected) | None => {
                tracing::debug!("Event stream closed");
                self.closed = true;
                Routed::Closed
            }
        }
    }
}
