//! Pairing coordinator
//!
//! Drives one pairing attempt on an unauthenticated connection:
//!
//! ```text
//! Idle -> IssuingCode -> AwaitingScan -> Success | Expired | Error
//! ```
//!
//! Every code the remote side issues is rendered exactly once; a newer
//! code replaces the previous one. After the success event the
//! coordinator keeps the connection open for a fixed grace period so the
//! remote side can finish provisioning before the caller disconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use pl_core::traits::CodeRenderer;
use pl_core::{DeviceId, PairingFailure};

use crate::dispatcher::{EventDispatcher, PairingEvent};

/// Default deadline for the whole pairing attempt
pub const DEFAULT_PAIRING_TIMEOUT: Duration = Duration::from_secs(120);

/// Default time to stay connected after a successful scan
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    IssuingCode,
    AwaitingScan,
    Success,
    Expired,
    Error,
}

impl PairingState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PairingState::Success | PairingState::Expired | PairingState::Error
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingSettings {
    /// Deadline for reaching a terminal pairing event
    pub timeout: Duration,
    /// Fixed wait after success, not cut short by anything
    pub grace_period: Duration,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PAIRING_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// One pairing attempt. Never retries on its own.
pub struct PairingCoordinator {
    renderer: Arc<dyn CodeRenderer>,
    settings: PairingSettings,
    state: PairingState,
    current_code: Option<String>,
    codes_rendered: usize,
}

impl PairingCoordinator {
    pub fn new(renderer: Arc<dyn CodeRenderer>, settings: PairingSettings) -> Self {
        Self {
            renderer,
            settings,
            state: PairingState::Idle,
            current_code: None,
            codes_rendered: 0,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    /// The most recent code, while one is outstanding
    pub fn current_code(&self) -> Option<&str> {
        self.current_code.as_deref()
    }

    pub fn codes_rendered(&self) -> usize {
        self.codes_rendered
    }

    /// Run the attempt to completion.
    ///
    /// Returns the paired device id only after the grace period has
    /// elapsed. Chat messages arriving at any point are delivered by
    /// `events`.
    pub async fn run(&mut self, events: &mut EventDispatcher) -> Result<DeviceId, PairingFailure> {
        if self.state != PairingState::Idle {
            tracing::warn!("Pairing attempt already used ({:?})", self.state);
            return Err(PairingFailure::StreamClosed);
        }

        self.state = PairingState::IssuingCode;
        let deadline = Instant::now() + self.settings.timeout;

        loop {
            let event = match tokio::time::timeout_at(deadline, events.next_pairing_event()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(self.fail(PairingState::Error, PairingFailure::StreamClosed)),
                Err(_) => return Err(self.fail(PairingState::Expired, PairingFailure::Expired)),
            };

            match event {
                PairingEvent::Code(code) => {
                    if self.current_code.is_some() {
                        tracing::debug!("Pairing code refreshed");
                    }
                    self.renderer.render(&code);
                    self.current_code = Some(code);
                    self.codes_rendered += 1;
                    self.state = PairingState::AwaitingScan;
                }
                PairingEvent::Success(device_id) => {
                    self.current_code = None;
                    tracing::info!(
                        "Paired as {}, staying connected for {:?}",
                        device_id,
                        self.settings.grace_period
                    );
                    events
                        .pump_until(Instant::now() + self.settings.grace_period)
                        .await;
                    self.state = PairingState::Success;
                    return Ok(device_id);
                }
                PairingEvent::Failure(reason) => {
                    return Err(self.fail(PairingState::Error, PairingFailure::Rejected(reason)));
                }
            }
        }
    }

    fn fail(&mut self, state: PairingState, failure: PairingFailure) -> PairingFailure {
        tracing::warn!("Pairing ended: {}", failure);
        self.state = state;
        self.current_code = None;
        failure
    }
}
