//! Connection handle
//!
//! Owns the one transport of a command run and tracks its
//! [`ConnectionState`]. Callers must `disconnect()` before the handle goes
//! away; if it is dropped while still open (an early return or a panic
//! unwinding through the command) the transport is aborted synchronously.

use std::sync::Arc;

use pl_core::traits::{Handshake, MessageHandler, Transport};
use pl_core::{ConnectError, ConnectionState, DeviceIdentity, TransportError};
use pl_protocol::ParticipantAddress;

use crate::dispatcher::EventDispatcher;

/// A live or potential network session for at most one device identity
pub struct ConnectionHandle<T: Transport> {
    transport: T,
    identity: Option<DeviceIdentity>,
    state: ConnectionState,
}

impl<T: Transport> ConnectionHandle<T> {
    /// Create a disconnected handle for `identity` (`None` before pairing)
    pub fn new(transport: T, identity: Option<DeviceIdentity>) -> Self {
        Self {
            transport,
            identity,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    /// Establish the session.
    ///
    /// With an identity, success means `Authenticated`; rejected material
    /// yields `SessionExpired` and leaves the handle `Failed`. Without one
    /// the handle ends up `ConnectedUnauthenticated`, usable for pairing only.
    /// Calling this on an open handle is a no-op.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        if self.state.accepts_events() {
            return Ok(());
        }
        if self.state == ConnectionState::Failed {
            self.transport.close().await;
        }

        self.state = ConnectionState::Connecting;
        tracing::debug!(
            "Connecting ({})",
            if self.identity.is_some() { "resume" } else { "pairing" }
        );

        let result = self.transport.open(self.identity.as_ref()).await;
        match (result, self.identity.is_some()) {
            (Ok(Handshake::Authenticated), true) => {
                self.state = ConnectionState::Authenticated;
                tracing::info!("Connected and authenticated");
                Ok(())
            }
            (Ok(Handshake::Authenticated), false) => {
                self.state = ConnectionState::Failed;
                Err(ConnectError::Transport(
                    "remote side authenticated a connection without an identity".to_string(),
                ))
            }
            (Ok(Handshake::PairingRequired), false) => {
                self.state = ConnectionState::ConnectedUnauthenticated;
                tracing::info!("Connected, pairing required");
                Ok(())
            }
            (Ok(Handshake::PairingRequired), true) => {
                self.state = ConnectionState::Failed;
                Err(ConnectError::SessionExpired)
            }
            (Err(e), _) => {
                self.state = ConnectionState::Failed;
                tracing::debug!("Connect failed: {}", e);
                Err(e)
            }
        }
    }

    /// Take the connection's inbound event stream.
    ///
    /// Only one dispatcher exists per connection; later calls, or calls
    /// while not connected, return `None`.
    pub fn subscribe(&mut self, message_handler: Arc<dyn MessageHandler>) -> Option<EventDispatcher> {
        if !self.state.accepts_events() {
            return None;
        }
        self.transport
            .take_events()
            .map(|events| EventDispatcher::new(events, message_handler))
    }

    /// Record the identity produced by a successful pairing on this connection
    pub fn mark_authenticated(&mut self, identity: DeviceIdentity) -> bool {
        if self.state != ConnectionState::ConnectedUnauthenticated {
            tracing::warn!("Ignoring pairing result while {}", self.state);
            return false;
        }
        self.identity = Some(identity);
        self.state = ConnectionState::Authenticated;
        true
    }

    /// Send a text message; requires an authenticated connection
    pub async fn send_text(
        &mut self,
        to: &ParticipantAddress,
        body: &str,
    ) -> Result<String, TransportError> {
        self.require_authenticated()?;
        self.transport.send_text(to, body).await
    }

    /// Ask the remote side to unlink this device; requires an authenticated connection
    pub async fn revoke(&mut self) -> Result<(), TransportError> {
        self.require_authenticated()?;
        self.transport.revoke().await
    }

    /// Close the transport. Safe to call in any state, any number of times.
    pub async fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.transport.close().await;
        tracing::debug!("Disconnected (was {})", self.state);
        self.state = ConnectionState::Disconnected;
    }

    fn require_authenticated(&self) -> Result<(), TransportError> {
        match self.state {
            ConnectionState::Authenticated => Ok(()),
            ConnectionState::Disconnected | ConnectionState::Failed => {
                Err(TransportError::NotConnected)
            }
            _ => Err(TransportError::NotAuthenticated),
        }
    }
}

impl<T: Transport> Drop for ConnectionHandle<T> {
    fn drop(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::warn!("Connection dropped while {}, aborting transport", self.state);
            self.transport.abort();
        }
    }
}
