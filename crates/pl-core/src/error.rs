//! Error taxonomy for pairlink
//!
//! Every user-facing operation resolves to a [`SessionError`]. Whether the
//! process should abort or just report is decided by
//! [`SessionError::is_fatal`].

use std::path::PathBuf;

use pl_protocol::AddressError;
use thiserror::Error;

/// Top-level error returned by the session lifecycle operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// The credential store could not be opened or queried
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// Establishing the connection failed
    #[error("{0}")]
    Connect(#[from] ConnectError),

    /// Pairing ended without success
    #[error("Pairing failed: {0}")]
    PairingFailed(#[from] PairingFailure),

    /// The operation needs a paired device and there is none
    #[error("Not logged in")]
    NotPaired,

    /// The recipient is not a well-formed participant address
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(#[from] AddressError),

    /// A request on an established connection failed
    #[error("{0}")]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Whether the process should abort with a failure status.
    ///
    /// Storage failures and connections that could not be established at
    /// all are fatal. Expired sessions are recoverable by pairing, and
    /// everything else is reported to the user.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::StorageUnavailable(_) | SessionError::Connect(ConnectError::Transport(_))
        )
    }
}

/// Errors raised while establishing a connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Stored session material was rejected by the remote side
    #[error("Session expired, need to login again")]
    SessionExpired,

    /// Network or handshake failure
    #[error("Failed to connect: {0}")]
    Transport(String),
}

/// Errors raised by requests on an open connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No transport is open
    #[error("not connected")]
    NotConnected,

    /// The connection exists but is not authenticated
    #[error("connection is not authenticated")]
    NotAuthenticated,

    /// The remote side did not answer in time
    #[error("request timed out")]
    Timeout,

    /// The connection dropped while the request was in flight
    #[error("connection lost")]
    ConnectionLost,

    /// The remote side answered with an error
    #[error("remote error: {0}")]
    Remote(String),

    /// Local I/O or framing failure
    #[error("I/O error: {0}")]
    Io(String),
}

/// Why a pairing attempt ended without success
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairingFailure {
    /// The remote side reported a terminal failure
    #[error("{0}")]
    Rejected(String),

    /// The pairing deadline elapsed before the code was scanned
    #[error("timed out waiting for the code to be scanned")]
    Expired,

    /// The event stream closed before a terminal event arrived
    #[error("connection closed during pairing")]
    StreamClosed,

    /// The remote side reported success but no matching identity was stored
    #[error("paired as {0} but the identity was not stored")]
    NotPersisted(String),
}

/// Credential store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage directory could not be created
    #[error("cannot create {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database could not be opened or initialized
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    /// A query against an open database failed
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// A stored row violates the identity invariants
    #[error("corrupt identity record: {0}")]
    Corrupt(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
