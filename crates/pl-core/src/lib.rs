//! pl-core: Core abstractions for pairlink
//!
//! Shared types, the error taxonomy, configuration, the on-disk credential
//! store and the traits that connect the session lifecycle to a concrete
//! protocol engine.

pub mod config;
pub mod error;
pub mod store;
pub mod time;
pub mod traits;
pub mod types;

pub use error::{ConnectError, PairingFailure, SessionError, StoreError, TransportError};
pub use store::CredentialStore;
pub use types::{ConnectionState, DeviceId, DeviceIdentity, IncomingMessage, SessionMaterial};
