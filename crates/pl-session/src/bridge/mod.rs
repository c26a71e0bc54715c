//! Bundled protocol engine
//!
//! Speaks the pairlink wire protocol over TCP to a bridge process that
//! holds the real messaging-service connection.

mod connector;
mod reader;

pub use connector::{BridgeConfig, BridgeConnector, BridgeTransport};
