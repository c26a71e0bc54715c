//! Session manager
//!
//! The three user-facing operations. Each one loads the resident identity,
//! opens at most one connection per attempt and always awaits that
//! connection's `disconnect()` before returning, whatever the inner
//! operation produced.

use std::sync::Arc;

use pl_core::traits::{CodeRenderer, Connector, MessageHandler};
use pl_core::{
    ConnectError, CredentialStore, DeviceId, DeviceIdentity, PairingFailure, SessionError,
    TransportError,
};
use pl_protocol::ParticipantAddress;

use crate::connection::ConnectionHandle;
use crate::pairing::{PairingCoordinator, PairingSettings};

/// Outcome of a successful `login`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A stored identity was accepted; nothing changed
    AlreadyAuthenticated,
    /// A new device was paired and persisted
    Paired(DeviceId),
}

/// Confirmation of a delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
    pub recipient: ParticipantAddress,
}

/// Outcome of a `logout` that reached the remote side or tried to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The remote side confirmed the unlink
    Revoked,
    /// The remote side already considered the session dead
    AlreadyExpired,
    /// The unlink request failed; the local identity was removed anyway
    RevokeFailed(TransportError),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub pairing: PairingSettings,
    /// Server used for recipients given as a bare phone number
    pub user_server: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            pairing: PairingSettings::default(),
            user_server: "s.whatsapp.net".to_string(),
        }
    }
}

/// Composes the store, connections and pairing into login/send/logout
pub struct SessionManager<C: Connector> {
    store: CredentialStore,
    connector: C,
    renderer: Arc<dyn CodeRenderer>,
    message_handler: Arc<dyn MessageHandler>,
    settings: SessionSettings,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(
        store: CredentialStore,
        connector: C,
        renderer: Arc<dyn CodeRenderer>,
        message_handler: Arc<dyn MessageHandler>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            store,
            connector,
            renderer,
            message_handler,
            settings,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Make sure this device is paired.
    ///
    /// A stored identity that still authenticates is left alone. An
    /// expired one is replaced by pairing on a fresh connection.
    pub async fn login(&self) -> Result<LoginOutcome, SessionError> {
        if let Some(identity) = self.store.load().await? {
            let mut conn = self.connection(Some(identity));
            let result = conn.connect().await;
            conn.disconnect().await;

            match result {
                Ok(()) => {
                    tracing::info!("Stored session is still valid");
                    return Ok(LoginOutcome::AlreadyAuthenticated);
                }
                Err(ConnectError::SessionExpired) => {
                    tracing::warn!("{}", ConnectError::SessionExpired);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut conn = self.connection(None);
        let result = self.pair(&mut conn).await;
        conn.disconnect().await;

        result.map(LoginOutcome::Paired)
    }

    /// Deliver `body` to `recipient` using the stored identity.
    ///
    /// The recipient is validated before any connection is made.
    pub async fn send_message(
        &self,
        recipient: &str,
        body: &str,
    ) -> Result<SendReceipt, SessionError> {
        let identity = self.store.load().await?.ok_or(SessionError::NotPaired)?;
        let recipient = ParticipantAddress::parse(recipient, &self.settings.user_server)?;

        let mut conn = self.connection(Some(identity));
        let result = self.deliver(&mut conn, &recipient, body).await;
        conn.disconnect().await;

        let message_id = result?;
        Ok(SendReceipt {
            message_id,
            recipient,
        })
    }

    /// Unlink this device and forget its identity.
    ///
    /// Once the remote side has been reached, the local identity is
    /// removed whether or not the unlink succeeded. If no connection could
    /// be made at all the identity is kept so the user can retry.
    pub async fn logout(&self) -> Result<LogoutOutcome, SessionError> {
        let identity = self.store.load().await?.ok_or(SessionError::NotPaired)?;

        let mut conn = self.connection(Some(identity));
        let result = self.revoke(&mut conn).await;
        conn.disconnect().await;

        let outcome = match result {
            Ok(()) => LogoutOutcome::Revoked,
            Err(SessionError::Connect(ConnectError::SessionExpired)) => {
                LogoutOutcome::AlreadyExpired
            }
            Err(SessionError::Transport(e)) => {
                tracing::warn!("Unlink request failed: {}", e);
                LogoutOutcome::RevokeFailed(e)
            }
            Err(e) => return Err(e),
        };

        self.store.clear().await?;
        Ok(outcome)
    }

    fn connection(&self, identity: Option<DeviceIdentity>) -> ConnectionHandle<C::Transport> {
        ConnectionHandle::new(self.connector.new_transport(&self.store), identity)
    }

    async fn pair(&self, conn: &mut ConnectionHandle<C::Transport>) -> Result<DeviceId, SessionError> {
        conn.connect().await?;

        let mut events = conn
            .subscribe(Arc::clone(&self.message_handler))
            .ok_or_else(|| ConnectError::Transport("pairing events unavailable".to_string()))?;

        let mut coordinator =
            PairingCoordinator::new(Arc::clone(&self.renderer), self.settings.pairing);
        let device_id = coordinator.run(&mut events).await?;

        let identity = match self.store.load().await? {
            Some(identity) if identity.id == device_id => identity,
            _ => return Err(PairingFailure::NotPersisted(device_id.to_string()).into()),
        };
        conn.mark_authenticated(identity);

        events.drain();
        Ok(device_id)
    }

    async fn deliver(
        &self,
        conn: &mut ConnectionHandle<C::Transport>,
        recipient: &ParticipantAddress,
        body: &str,
    ) -> Result<String, SessionError> {
        conn.connect().await?;
        let mut events = conn.subscribe(Arc::clone(&self.message_handler));

        let send = conn.send_text(recipient, body);
        let message_id = match events.as_mut() {
            Some(events) => events.serve(send).await?,
            None => send.await?,
        };
        tracing::info!("Sent {} to {}", message_id, recipient);

        if let Some(events) = events.as_mut() {
            events.drain();
        }
        Ok(message_id)
    }

    async fn revoke(&self, conn: &mut ConnectionHandle<C::Transport>) -> Result<(), SessionError> {
        conn.connect().await?;
        let mut events = conn.subscribe(Arc::clone(&self.message_handler));

        let revoke = conn.revoke();
        match events.as_mut() {
            Some(events) => events.serve(revoke).await?,
            None => revoke.await?,
        }
        tracing::info!("Device unlinked");

        if let Some(events) = events.as_mut() {
            events.drain();
        }
        Ok(())
    }
}
