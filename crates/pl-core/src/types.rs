//! Core domain types

use bytes::Bytes;
use std::fmt;

/// Identifier the remote service assigned to this device when it paired.
///
/// Never empty: an authenticated connection is always backed by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Parse a device ID, rejecting empty or blank input
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque cryptographic session material.
///
/// Owned by the protocol engine; pairlink stores and hands it back but
/// never looks inside.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionMaterial(Bytes);

impl SessionMaterial {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }
}

impl fmt::Debug for SessionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionMaterial(<{} bytes redacted>)", self.0.len())
    }
}

/// The local participant identity, present once pairing has succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: DeviceId,
    pub material: SessionMaterial,
    /// Unix timestamp (ms) of the pairing that produced this identity
    pub paired_at_ms: u64,
}

impl DeviceIdentity {
    pub fn new(id: DeviceId, material: SessionMaterial, paired_at_ms: u64) -> Self {
        Self {
            id,
            material,
            paired_at_ms,
        }
    }
}

/// State of a connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport is open
    Disconnected,
    /// The handshake is in progress
    Connecting,
    /// Open, but only usable for pairing
    ConnectedUnauthenticated,
    /// Open and backed by a paired identity
    Authenticated,
    /// The last connect attempt failed
    Failed,
}

impl ConnectionState {
    /// Whether inbound events may be subscribed to in this state
    pub fn accepts_events(&self) -> bool {
        matches!(
            self,
            ConnectionState::ConnectedUnauthenticated | ConnectionState::Authenticated
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::ConnectedUnauthenticated => write!(f, "connected-unauthenticated"),
            ConnectionState::Authenticated => write!(f, "authenticated"),
            ConnectionState::Failed => write!(f, "failed"),
        }
    }
}

/// A chat message received while connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: String,
    /// Sender address as reported by the remote side
    pub from: String,
    pub body: String,
    /// Unix timestamp (ms)
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_rejects_blank() {
        assert!(DeviceId::parse("").is_none());
        assert!(DeviceId::parse("   ").is_none());
        assert_eq!(
            DeviceId::parse("628123:4@s.whatsapp.net").unwrap().as_str(),
            "628123:4@s.whatsapp.net"
        );
    }

    #[test]
    fn test_session_material_debug_is_redacted() {
        let material = SessionMaterial::new(vec![0xde, 0xad, 0xbe, 0xef]);
        let rendered = format!("{:?}", material);
        assert_eq!(rendered, "SessionMaterial(<4 bytes redacted>)");
    }

    #[test]
    fn test_connection_state_accepts_events() {
        assert!(ConnectionState::Authenticated.accepts_events());
        assert!(ConnectionState::ConnectedUnauthenticated.accepts_events());
        assert!(!ConnectionState::Connecting.accepts_events());
        assert!(!ConnectionState::Failed.accepts_events());
        assert!(!ConnectionState::Disconnected.accepts_events());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(
            ConnectionState::ConnectedUnauthenticated.to_string(),
            "connected-unauthenticated"
        );
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
    }
}
