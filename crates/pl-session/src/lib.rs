//! pl-session: Session lifecycle for pairlink
//!
//! Takes a local device from "unpaired" to "authenticated" and back:
//! [`SessionManager`] composes the credential store, a [`ConnectionHandle`]
//! and the [`PairingCoordinator`] into the `login`, `send` and `logout`
//! operations, while the [`EventDispatcher`] routes whatever the remote
//! side pushes in the meantime.

pub mod bridge;
pub mod connection;
pub mod dispatcher;
pub mod manager;
pub mod pairing;

pub use bridge::{BridgeConfig, BridgeConnector, BridgeTransport};
pub use connection::ConnectionHandle;
pub use dispatcher::{EventDispatcher, PairingEvent};
pub use manager::{LoginOutcome, LogoutOutcome, SendReceipt, SessionManager, SessionSettings};
pub use pairing::{PairingCoordinator, PairingSettings, PairingState};
