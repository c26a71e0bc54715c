//! Shared fakes for session lifecycle tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use pl_core::traits::{CodeRenderer, Connector, Handshake, InboundEvent, MessageHandler, Transport};
use pl_core::{
    ConnectError, CredentialStore, DeviceId, DeviceIdentity, IncomingMessage, SessionMaterial,
    TransportError,
};
use pl_protocol::ParticipantAddress;
use pl_session::{PairingSettings, SessionManager, SessionSettings};

pub const PAIRED_DEVICE: &str = "628123456789:7@s.whatsapp.net";

/// Counts every call that reaches a fake transport
#[derive(Debug, Default)]
pub struct Calls {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub aborts: AtomicUsize,
    pub event_streams: AtomicUsize,
    pub sends: AtomicUsize,
    pub revokes: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        Self::get(&self.opens)
    }

    pub fn closes(&self) -> usize {
        Self::get(&self.closes)
    }

    pub fn event_streams(&self) -> usize {
        Self::get(&self.event_streams)
    }

    pub fn sends(&self) -> usize {
        Self::get(&self.sends)
    }

    pub fn revokes(&self) -> usize {
        Self::get(&self.revokes)
    }
}

/// One step of a scripted pairing stream
#[derive(Debug, Clone)]
pub enum Step {
    Code(&'static str),
    /// Persist [`paired_identity`] and report success
    Success,
    /// Report success without persisting anything
    UnsavedSuccess,
    Failure(&'static str),
    Chat(&'static str),
    Wait(Duration),
    Close,
}

/// What the fake remote side does
#[derive(Debug, Clone)]
pub struct Script {
    /// Material the remote side accepts on resume
    pub valid_material: Option<&'static [u8]>,
    pub connect_error: Option<ConnectError>,
    pub pairing: Vec<Step>,
    /// Chat messages queued as soon as an authenticated connection opens
    pub inbox: Vec<&'static str>,
    pub send_result: Result<String, TransportError>,
    pub revoke_result: Result<(), TransportError>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            valid_material: Some(b"valid"),
            connect_error: None,
            pairing: Vec::new(),
            inbox: Vec::new(),
            send_result: Ok("3EB0C0FFEE".to_string()),
            revoke_result: Ok(()),
        }
    }
}

pub fn paired_identity() -> DeviceIdentity {
    DeviceIdentity::new(
        DeviceId::parse(PAIRED_DEVICE).unwrap(),
        SessionMaterial::new(b"valid".to_vec()),
        1_700_000_000_000,
    )
}

pub fn stale_identity() -> DeviceIdentity {
    DeviceIdentity::new(
        DeviceId::parse("628000000000:3@s.whatsapp.net").unwrap(),
        SessionMaterial::new(b"stale".to_vec()),
        1_600_000_000_000,
    )
}

pub struct FakeConnector {
    pub script: Arc<Script>,
    pub calls: Arc<Calls>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(Calls::default()),
        }
    }
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn new_transport(&self, store: &CredentialStore) -> FakeTransport {
        FakeTransport {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
            store: store.clone(),
            events: None,
            inbox_tx: None,
            player: None,
        }
    }
}

pub struct FakeTransport {
    script: Arc<Script>,
    calls: Arc<Calls>,
    store: CredentialStore,
    events: Option<mpsc::Receiver<InboundEvent>>,
    inbox_tx: Option<mpsc::Sender<InboundEvent>>,
    player: Option<JoinHandle<()>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&mut self, identity: Option<&DeviceIdentity>) -> Result<Handshake, ConnectError> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.script.connect_error {
            return Err(e.clone());
        }

        let (tx, rx) = mpsc::channel(64);
        self.events = Some(rx);

        match identity {
            Some(identity) => {
                if self.script.valid_material != Some(identity.material.as_bytes()) {
                    self.events = None;
                    return Err(ConnectError::SessionExpired);
                }
                for body in &self.script.inbox {
                    let _ = tx.try_send(chat(body));
                }
                self.inbox_tx = Some(tx);
                Ok(Handshake::Authenticated)
            }
            None => {
                let steps = self.script.pairing.clone();
                let store = self.store.clone();
                self.player = Some(tokio::spawn(play(steps, tx, store)));
                Ok(Handshake::PairingRequired)
            }
        }
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<InboundEvent>> {
        let events = self.events.take();
        if events.is_some() {
            self.calls.event_streams.fetch_add(1, Ordering::SeqCst);
        }
        events
    }

    async fn send_text(&mut self, _to: &ParticipantAddress, _body: &str) -> Result<String, TransportError> {
        self.calls.sends.fetch_add(1, Ordering::SeqCst);
        self.script.send_result.clone()
    }

    async fn revoke(&mut self) -> Result<(), TransportError> {
        self.calls.revokes.fetch_add(1, Ordering::SeqCst);
        self.script.revoke_result.clone()
    }

    async fn close(&mut self) {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        self.release();
    }

    fn abort(&mut self) {
        self.calls.aborts.fetch_add(1, Ordering::SeqCst);
        self.release();
    }
}

impl FakeTransport {
    fn release(&mut self) {
        if let Some(player) = self.player.take() {
            player.abort();
        }
        self.events = None;
        self.inbox_tx = None;
    }
}

async fn play(steps: Vec<Step>, tx: mpsc::Sender<InboundEvent>, store: CredentialStore) {
    for step in steps {
        let event = match step {
            Step::Code(code) => InboundEvent::PairCode(code.to_string()),
            Step::Success => {
                let identity = paired_identity();
                store.save(&identity).await.unwrap();
                InboundEvent::PairSuccess(identity.id)
            }
            Step::UnsavedSuccess => InboundEvent::PairSuccess(paired_identity().id),
            Step::Failure(reason) => InboundEvent::PairFailure(reason.to_string()),
            Step::Chat(body) => chat(body),
            Step::Wait(delay) => {
                tokio::time::sleep(delay).await;
                continue;
            }
            Step::Close => InboundEvent::Disconnected,
        };
        if tx.send(event).await.is_err() {
            return;
        }
    }
    // hold the stream open until the transport is closed
    std::future::pending::<()>().await;
}

fn chat(body: &str) -> InboundEvent {
    InboundEvent::Message(IncomingMessage {
        message_id: format!("msg-{}", body),
        from: "628111111111@s.whatsapp.net".to_string(),
        body: body.to_string(),
        timestamp: 1_700_000_000_000,
    })
}

/// Records rendered codes and delivered messages
#[derive(Debug, Default)]
pub struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl CodeRenderer for Recorder {
    fn render(&self, code: &str) {
        self.0.lock().unwrap().push(code.to_string());
    }
}

impl MessageHandler for Recorder {
    fn on_message(&self, message: &IncomingMessage) {
        self.0.lock().unwrap().push(message.body.clone());
    }
}

pub const GRACE: Duration = Duration::from_millis(50);

pub fn settings() -> SessionSettings {
    SessionSettings {
        pairing: PairingSettings {
            timeout: Duration::from_secs(5),
            grace_period: GRACE,
        },
        user_server: "s.whatsapp.net".to_string(),
    }
}

pub struct Fixture {
    pub _dir: TempDir,
    pub store: CredentialStore,
    pub calls: Arc<Calls>,
    pub codes: Arc<Recorder>,
    pub messages: Arc<Recorder>,
    pub manager: SessionManager<FakeConnector>,
}

pub async fn fixture(script: Script, resident: Option<DeviceIdentity>) -> Fixture {
    fixture_with(script, resident, settings()).await
}

pub async fn fixture_with(
    script: Script,
    resident: Option<DeviceIdentity>,
    settings: SessionSettings,
) -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();
    if let Some(identity) = resident {
        store.save(&identity).await.unwrap();
    }

    let connector = FakeConnector::new(script);
    let calls = Arc::clone(&connector.calls);
    let codes = Arc::new(Recorder::default());
    let messages = Arc::new(Recorder::default());

    let manager = SessionManager::new(
        store.clone(),
        connector,
        codes.clone(),
        messages.clone(),
        settings,
    );

    Fixture {
        _dir: dir,
        store,
        calls,
        codes,
        messages,
        manager,
    }
}
