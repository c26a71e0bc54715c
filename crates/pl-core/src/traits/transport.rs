//! Protocol engine traits

use async_trait::async_trait;
use tokio::sync::mpsc;

use pl_protocol::ParticipantAddress;

use crate::error::{ConnectError, TransportError};
use crate::store::CredentialStore;
use crate::types::{DeviceId, DeviceIdentity, IncomingMessage};

/// Result of a successful transport handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// The stored identity was accepted
    Authenticated,
    /// No identity was presented; the connection can only be used to pair
    PairingRequired,
}

/// Events pushed by the remote side, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A new scannable pairing code, superseding any earlier one
    PairCode(String),
    /// Pairing succeeded. The engine has already persisted the identity.
    PairSuccess(DeviceId),
    /// Pairing ended with a remote failure
    PairFailure(String),
    /// A chat message addressed to this device
    Message(IncomingMessage),
    /// The transport closed underneath us
    Disconnected,
}

/// One network session with the remote messaging service.
///
/// Implementations own their sockets and background tasks. `close` and
/// `abort` must both be idempotent.
#[async_trait]
pub trait Transport: Send {
    /// Establish the session, presenting `identity` if there is one.
    ///
    /// Stored material that the remote side refuses yields
    /// `ConnectError::SessionExpired`.
    async fn open(&mut self, identity: Option<&DeviceIdentity>) -> Result<Handshake, ConnectError>;

    /// Take the inbound event stream. Yields `Some` at most once per `open`.
    fn take_events(&mut self) -> Option<mpsc::Receiver<InboundEvent>>;

    /// Deliver a text message, returning the remote message id
    async fn send_text(
        &mut self,
        to: &ParticipantAddress,
        body: &str,
    ) -> Result<String, TransportError>;

    /// Ask the remote side to unlink this device
    async fn revoke(&mut self) -> Result<(), TransportError>;

    /// Gracefully close the session and release its resources
    async fn close(&mut self);

    /// Release resources without awaiting; used when a handle is dropped
    /// while still open
    fn abort(&mut self);
}

/// Builds transports bound to a credential store
pub trait Connector: Send + Sync {
    type Transport: Transport + 'static;

    /// Create an unopened transport that persists pairing results into `store`
    fn new_transport(&self, store: &CredentialStore) -> Self::Transport;
}
