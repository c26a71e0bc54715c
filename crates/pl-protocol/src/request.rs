//! Request correlation identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlates a client request with the bridge's reply.
///
/// Frames pushed by the bridge on its own initiative (pairing codes,
/// incoming messages, heartbeats) carry [`RequestId::UNSOLICITED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u32);

impl RequestId {
    /// Identifier for frames that answer nothing
    pub const UNSOLICITED: RequestId = RequestId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn is_unsolicited(&self) -> bool {
        *self == Self::UNSOLICITED
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

impl From<u32> for RequestId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
